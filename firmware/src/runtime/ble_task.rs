use handheld_scanner::BleScanWorker;

use super::board::BoardBle;

#[embassy_executor::task]
pub async fn run(mut worker: BleScanWorker<'static, BoardBle>) -> ! {
    worker.run().await
}
