mod environment;
mod session;

use std::env;
use std::io::{self, BufRead, Write};
use std::process;
use std::sync::mpsc;
use std::thread;

use environment::Profile;

fn main() -> io::Result<()> {
    let profile = parse_profile().unwrap_or_else(|err| {
        eprintln!("{err}");
        eprintln!("Usage: scan-emulator [--profile <quiet|busy|low-memory>]");
        process::exit(2);
    });

    let stdout = io::stdout();
    let mut writer = stdout.lock();
    writeln!(
        writer,
        "Handheld scanner emulator ({} environment). Type `help` for commands or `exit` to quit.",
        profile.tag()
    )?;

    let (lines, input) = mpsc::channel();
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if lines.send(line).is_err() {
                break;
            }
        }
    });

    session::run(profile, &input, &mut writer, None)?;
    writeln!(writer, "Session closed.")
}

fn parse_profile() -> Result<Profile, String> {
    let mut args = env::args().skip(1);
    if let Some(arg) = args.next() {
        if let Some(value) = arg.strip_prefix("--profile=") {
            Profile::from_tag(value)
        } else if arg == "--profile" {
            if let Some(value) = args.next() {
                Profile::from_tag(&value)
            } else {
                Err("Expected value after --profile".to_string())
            }
        } else {
            Profile::from_tag(&arg)
        }
    } else {
        Ok(Profile::Busy)
    }
}
