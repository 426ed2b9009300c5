use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReceiptError {
    #[error("Failed to generate unique receipt code after {0} attempts")]
    Exhausted(usize),

    #[error("Malformed receipt code: {0}")]
    Malformed(String),
}
