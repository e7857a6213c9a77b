use dice_stack::{DiceEngine, MemoryTables, Settings};
use std::io::{self, BufRead, Write};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let settings = match std::env::args().nth(1) {
        Some(path) => Settings::from_json(&std::fs::read_to_string(path)?)?,
        None => Settings::default(),
    };
    log::debug!("starting with {:?}", settings);
    let engine = DiceEngine::new(settings, MemoryTables::new());

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    print!("> ");
    io::stdout().flush()?;
    while let Some(Ok(line)) = lines.next() {
        let formula = line.trim();
        if !formula.is_empty() {
            match engine.roll(formula).await {
                Ok(roller) => println!("{}\n{}", roller.rendered(), roller.trace()),
                Err(why) => eprintln!("Error: {}", why),
            }
        }
        print!("> ");
        io::stdout().flush()?;
    }
    Ok(())
}
