use std::process::ExitCode;

fn main() -> ExitCode {
    match conlog::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("conlog: {}", err);
            ExitCode::from(2)
        }
    }
}
