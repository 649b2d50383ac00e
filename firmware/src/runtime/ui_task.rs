use embassy_time::{Duration, Ticker};
use handheld_scanner::UiBridge;

/// Display refresh period.
const FRAME_MS: u32 = 33;

#[embassy_executor::task]
pub async fn run(mut ui: UiBridge<'static>) -> ! {
    let mut ticker = Ticker::every(Duration::from_millis(u64::from(FRAME_MS)));
    loop {
        ui.drain(|_| {});
        ui.tick(FRAME_MS);
        ticker.next().await;
    }
}
