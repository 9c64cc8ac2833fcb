use chrono::NaiveDate;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// Which binary variants one generation pass produces. `Both` renders two
/// buffers from the same `LayoutResult`; layout is never computed twice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportMode {
    #[default]
    Standard,
    Compressed,
    Both,
}

/// One downloadable document produced by the binary sink.
#[derive(Debug, Clone)]
pub struct ExportArtifact {
    pub filename: String,
    pub bytes: Vec<u8>,
    pub compressed: bool,
}

/// `{client}-Report-{yyyyMMdd}.pdf`, with the `_compressed` suffix for the
/// low-quality variant. The client name is reduced to filesystem-safe
/// characters.
pub fn report_filename(client_name: &str, date: NaiveDate, compressed: bool) -> String {
    let suffix = if compressed { "_compressed" } else { "" };
    format!(
        "{}-Report-{}{}.pdf",
        sanitize(client_name),
        date.format("%Y%m%d"),
        suffix
    )
}

fn sanitize(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut last_dash = false;
    for ch in name.trim().chars() {
        let mapped = if ch.is_ascii_alphanumeric() || ch == '.' || ch == '_' {
            Some(ch)
        } else if ch.is_whitespace() || ch == '-' {
            Some('-')
        } else {
            None
        };
        match mapped {
            Some('-') if last_dash => {}
            Some('-') => {
                out.push('-');
                last_dash = true;
            }
            Some(ch) => {
                out.push(ch);
                last_dash = false;
            }
            None => {}
        }
    }
    let trimmed = out.trim_matches('-');
    if trimmed.is_empty() {
        "Client".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Debounce for generation triggers: while one pass is in flight, or until
/// the cooldown since the last pass elapses, new triggers coalesce into
/// nothing and the caller re-triggers later.
#[derive(Debug)]
pub struct GenerationGuard {
    cooldown: Duration,
    in_flight: AtomicBool,
    last_finished: Mutex<Option<Instant>>,
}

impl GenerationGuard {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            in_flight: AtomicBool::new(false),
            last_finished: Mutex::new(None),
        }
    }

    /// Claims the guard for one pass, or `None` if the trigger coalesces.
    pub fn try_begin(&self) -> Option<GenerationPermit<'_>> {
        if self.in_flight.swap(true, Ordering::SeqCst) {
            return None;
        }
        let within_cooldown = self
            .last_finished
            .lock()
            .ok()
            .and_then(|last| *last)
            .is_some_and(|at| at.elapsed() < self.cooldown);
        if within_cooldown {
            self.in_flight.store(false, Ordering::SeqCst);
            return None;
        }
        Some(GenerationPermit { guard: self })
    }
}

/// Releases the guard and stamps the cooldown when dropped.
pub struct GenerationPermit<'a> {
    guard: &'a GenerationGuard,
}

impl Drop for GenerationPermit<'_> {
    fn drop(&mut self) {
        if let Ok(mut last) = self.guard.last_finished.lock() {
            *last = Some(Instant::now());
        }
        self.guard.in_flight.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 8, 7).expect("date")
    }

    #[test]
    fn filename_follows_the_convention() {
        assert_eq!(
            report_filename("Acme Logistics", date(), false),
            "Acme-Logistics-Report-20260807.pdf"
        );
        assert_eq!(
            report_filename("Acme Logistics", date(), true),
            "Acme-Logistics-Report-20260807_compressed.pdf"
        );
    }

    #[test]
    fn client_name_is_sanitized() {
        assert_eq!(
            report_filename("Näxt / Gen  Sites!", date(), false),
            "Nxt-Gen-Sites-Report-20260807.pdf"
        );
        assert_eq!(report_filename("///", date(), false), "Client-Report-20260807.pdf");
    }

    #[test]
    fn guard_blocks_while_in_flight() {
        let guard = GenerationGuard::new(Duration::ZERO);
        let permit = guard.try_begin().expect("first trigger runs");
        assert!(guard.try_begin().is_none(), "second trigger coalesces");
        drop(permit);
        assert!(guard.try_begin().is_some(), "free again after the pass");
    }

    #[test]
    fn guard_enforces_the_cooldown() {
        let guard = GenerationGuard::new(Duration::from_secs(60));
        drop(guard.try_begin().expect("first trigger runs"));
        assert!(
            guard.try_begin().is_none(),
            "trigger inside the cooldown coalesces"
        );
    }

    #[test]
    fn zero_cooldown_allows_back_to_back_runs() {
        let guard = GenerationGuard::new(Duration::ZERO);
        drop(guard.try_begin().expect("first"));
        assert!(guard.try_begin().is_some(), "second");
    }
}
