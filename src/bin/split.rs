use std::env;

use anyhow::Result;
use tokio::io::{self, BufReader};
use tubebatch::runtime::split::{self, Splitter, DEFAULT_FFMPEG};

const DEFAULT_LOG_DIRECTIVE: &str = "warn";
const ENV_FFMPEG: &str = "TUBEBATCH_FFMPEG";

#[tokio::main]
async fn main() -> Result<()> {
    if env::var_os("RUST_LOG").is_none() {
        env::set_var("RUST_LOG", DEFAULT_LOG_DIRECTIVE);
    }
    tubebatch::init_tracing();

    let mut stdin = BufReader::new(io::stdin());
    let mut stdout = io::stdout();
    let answers = split::prompt(&mut stdin, &mut stdout).await?;

    let request = match answers.validate().await {
        Ok(request) => request,
        Err(err) => {
            eprintln!("Error: {err}");
            return Ok(());
        }
    };

    let ffmpeg = env::var_os(ENV_FFMPEG).unwrap_or_else(|| DEFAULT_FFMPEG.into());
    let splitter = Splitter::new(ffmpeg, ".");
    match splitter.split(&request).await {
        Ok(output) => {
            println!("Audio split at {}.", request.timestamp());
            println!("Part 1 saved as {}", output.part_one.display());
            println!("Part 2 saved as {}", output.part_two.display());
        }
        Err(err) => eprintln!("Error: {err:#}"),
    }

    Ok(())
}
