use std::io;
use std::path::Path;
use std::sync::mpsc;

#[allow(dead_code)]
#[path = "../environment.rs"]
mod environment;
#[allow(dead_code)]
#[path = "../session.rs"]
mod session;

use environment::Profile;
use session::TranscriptLogger;

const TRANSCRIPT_DIR: &str = "transcripts";

fn main() -> io::Result<()> {
    record_profile(
        Profile::Quiet,
        &["help", "ble", "ble 10", "wait 10500", "devices", "ble ack", "status"],
    )?;
    record_profile(
        Profile::Busy,
        &[
            "wifi",
            "ble 30",
            "wait 2000",
            "ble 10",
            "wait 4000",
            "ble cancel",
            "wait 600",
            "devices",
            "aps",
            "status",
        ],
    )?;
    record_profile(
        Profile::LowMemory,
        &["ble", "ble 20", "wait 200", "wifi", "wifi stop", "wait 1800", "status"],
    )?;
    Ok(())
}

fn record_profile(profile: Profile, script: &[&str]) -> io::Result<()> {
    let path = Path::new(TRANSCRIPT_DIR).join(format!("emulator-{}.log", profile.tag()));
    let transcript = TranscriptLogger::create(&path, profile)?;

    let (lines, input) = mpsc::channel();
    for line in script {
        let _ = lines.send((*line).to_string());
    }
    let _ = lines.send("exit".to_string());

    session::run(profile, &input, &mut io::sink(), Some(transcript))?;
    println!("wrote {}", path.display());
    Ok(())
}
