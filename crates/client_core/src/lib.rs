//! Client side of the knowledge-graph question-answering service: the HTTP
//! contract, per-session input state, and the controller that turns user
//! actions into requests and requests into things a front end renders.

pub mod api;
pub mod busy;
pub mod config;
pub mod controller;
pub mod error;
pub mod graph_image;
pub mod notify;
pub mod session;
pub mod transport;
pub mod view;

pub use api::{GraphQaApi, HttpGraphQaApi};
pub use busy::ActionKind;
pub use config::{load_settings, ClientSettings};
pub use controller::{ActionOutcome, RejectReason, UiController};
pub use error::{ClientError, ClientResult};
pub use graph_image::{GraphImage, GraphImageSlot, ImageHandleFactory};
pub use notify::{Notification, NotificationCenter, NotificationLevel, Toast, ToastPhase};
pub use session::SessionState;
pub use view::{AnswerView, CacheLine, ExplorerPane, UiView};
