use handheld_scanner::ScanOrchestrator;
use scan_core::guard::FixedMemoryProbe;

use super::board::BoardWifi;

#[embassy_executor::task]
pub async fn run(mut orchestrator: ScanOrchestrator<'static, BoardWifi, FixedMemoryProbe>) -> ! {
    orchestrator.run().await
}
