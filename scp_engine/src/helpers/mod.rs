mod attachments;

pub use attachments::{classify_attachment, AttachmentKind};
