use contact_tracing_sim::runner::run_with_args;

fn main() {
    match run_with_args() {
        Ok((summary, _)) => {
            println!(
                "{}",
                serde_json::to_string(&summary).unwrap_or_else(|_| format!("{summary:?}"))
            );
        }
        Err(error) => {
            eprintln!("{error}");
            std::process::exit(1);
        }
    }
}
