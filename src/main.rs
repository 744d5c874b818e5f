use std::process::ExitCode;

fn main() -> ExitCode {
  sleepy_lib::run()
}
