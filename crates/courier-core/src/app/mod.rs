//! App - アプリケーション層
//!
//! このモジュールは、ports と typed を組み合わせて dispatch を実装します。
//!
//! # 主要コンポーネント
//! - **Mediator**: send / execute / publish の表面
//! - **MediatorBuilder**: Mediator の構築とワイヤリング
//! - **PipelineComposer**: behavior の合成
//! - **Invoker**: 型消去された handler 呼び出し

pub mod builder;
pub mod invoker;
pub mod mediator;
pub mod pipeline;

// 主要な型を再エクスポート
pub use self::builder::{BuildError, MediatorBuilder};
pub use self::invoker::{ErasedNotification, ErasedRequest, build_invoker};
pub use self::mediator::{Mediator, Publisher, Sender};
pub use self::pipeline::{Operation, PipelineComposer};
