use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    ashlauncher_lib::init_tracing();

    match ashlauncher_lib::run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{}", err);
            ExitCode::FAILURE
        }
    }
}
