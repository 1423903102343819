mod cli;
mod settings;

use anyhow::{Context, Result};
use cli::{Args, Command, USAGE};
use i2cbus_core::{BusSession, TransactionLog};
use settings::Settings;

fn main() -> Result<()> {
    let args = Args::parse(std::env::args().skip(1)).context("invalid arguments")?;

    env_logger::Builder::new()
        .filter_level(if args.verbose { log::LevelFilter::Debug } else { log::LevelFilter::Warn })
        .parse_default_env()
        .init();

    if args.command == Command::Help {
        println!("{USAGE}");
        return Ok(());
    }

    let settings = Settings::load()?;
    let device = args.device.clone().unwrap_or(settings.device);
    log::debug!("using {} with a {} entry journal", device.display(), settings.journal_entries);

    let journal = TransactionLog::shared(settings.journal_entries);
    let mut session: BusSession = BusSession::with_journal(journal.clone());
    session.open(&device)?;

    let outcome = execute(&mut session, &args.command);
    session.close();

    if args.trace {
        print!("{}", journal.lock().to_text(true));
    }
    outcome
}

fn execute(session: &mut BusSession, command: &Command) -> Result<()> {
    match command {
        Command::Scan { json } => {
            let result = session.scan()?;
            if *json {
                println!("{}", serde_json::to_string(&result)?);
            } else {
                println!("{result}");
            }
        }
        Command::Read { addr } => {
            session.select_address(addr.get())?;
            let value = session.read_byte()?;
            println!("0x{value:02x}");
        }
        Command::Write { addr, value } => {
            session.select_address(addr.get())?;
            session.write_byte(*value)?;
        }
        Command::WriteWord { addr, command, word } => {
            session.select_address(addr.get())?;
            session.write_word(*command, *word)?;
        }
        Command::WriteBlock { addr, command, data } => {
            session.select_address(addr.get())?;
            session.write_block(*command, data)?;
        }
        Command::Help => {}
    }
    Ok(())
}
