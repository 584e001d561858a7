use tripdesk_derive::tripdesk_error;

#[tripdesk_error]
pub enum DemoError {
    #[error("IO error: {source}")]
    Io {
        #[source]
        source: std::io::Error,
    },
}

fn main() {}
