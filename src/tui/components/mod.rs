pub mod input_box;
pub mod message;
pub mod message_list;
pub mod session_panel;

pub use input_box::{InputBox, InputEvent};
pub use message_list::{MessageList, MessageListState};
pub use session_panel::{SessionPanel, SessionPanelEvent, SessionPanelState};
