//! Background jobs. Call `spawn_all` once during startup.

use crate::services::AttendanceService;
use std::time::Duration;

/// Spawn all background tasks.
///
/// The tasks are detached via `tokio::spawn`; this function does not block.
pub fn spawn_all(attendance_service: AttendanceService, auto_close_interval_secs: u64) {
    // close attendance left open by members who never tapped out
    {
        let svc = attendance_service.clone();
        let interval = Duration::from_secs(auto_close_interval_secs.max(1));
        tokio::spawn(async move {
            loop {
                match svc.close_stale_records().await {
                    Ok(n) if n > 0 => log::info!("Stale attendance records closed: {n}"),
                    Ok(_) => {}
                    Err(e) => log::error!("Failed to close stale attendance records: {e:?}"),
                }
                tokio::time::sleep(interval).await;
            }
        });
    }
}
