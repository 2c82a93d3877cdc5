use std::process::ExitCode;

fn main() -> ExitCode {
    match prompthub_cli::run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
