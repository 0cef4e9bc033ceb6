pub mod book;
pub mod lenient;
pub mod question;
pub mod storage;

pub use book::{attach_progress, Book, BookWithProgress, NewBook, ProcessingProgress, ProcessingStatus};
pub use question::Question;
pub use storage::{ListOptions, SortOrder, StoredObject};
