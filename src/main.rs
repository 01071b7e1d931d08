use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    cleanforge_lib::run().await
}
