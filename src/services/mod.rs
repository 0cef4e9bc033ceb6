pub mod book_service;
pub mod csv_export;
pub mod scanner;
pub mod schema;

pub use book_service::BookService;
pub use csv_export::{export_file_name, render_questions_csv, CSV_HEADER};
pub use scanner::find_new_books;
pub use schema::{SchemaBootstrap, TableOutcome};
