pub mod attachment;
pub mod avatar;
pub mod read_state;

pub use attachment::{Attachment, UploadFile};
pub use read_state::{AckBulk, AckEntry, ReadState};
