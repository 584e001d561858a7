use tripdesk_derive::tripdesk_error;

#[tripdesk_error]
pub enum DemoError {
    #[error("IO error: {0}")]
    Io(std::io::Error),
}

fn main() {}
