// Full-screen image slideshow over a folder's images. Auto-advances with
// wrap-around; any index change (manual or automatic) restarts the period.
// A zero period turns auto-advance off.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Notify, watch};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use vandash_api::FileItem;

pub struct Slideshow {
    images: Arc<[FileItem]>,
    index: Arc<watch::Sender<usize>>,
    reset: Arc<Notify>,
    cancel: CancellationToken,
}

impl Slideshow {
    /// Open at `start` (clamped). `None` when there is nothing to show.
    /// `period` of zero shows the images without auto-advancing.
    pub fn open(images: Vec<FileItem>, start: usize, period: Duration) -> Option<Self> {
        if images.is_empty() {
            return None;
        }
        let images: Arc<[FileItem]> = images.into();
        let start = start.min(images.len() - 1);
        let (index, _) = watch::channel(start);
        let index = Arc::new(index);
        let reset = Arc::new(Notify::new());
        let cancel = CancellationToken::new();

        if !period.is_zero() {
            tokio::spawn(advance_task(
                images.len(),
                Arc::clone(&index),
                Arc::clone(&reset),
                period,
                cancel.clone(),
            ));
        }
        debug!(count = images.len(), start, ?period, "slideshow opened");

        Some(Self {
            images,
            index,
            reset,
            cancel,
        })
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn index(&self) -> usize {
        *self.index.borrow()
    }

    pub fn current(&self) -> Option<&FileItem> {
        self.images.get(self.index())
    }

    pub fn next(&self) {
        let len = self.len();
        self.index.send_modify(|i| *i = (*i + 1) % len);
        self.reset.notify_one();
    }

    pub fn prev(&self) {
        let len = self.len();
        self.index.send_modify(|i| *i = (*i + len - 1) % len);
        self.reset.notify_one();
    }

    pub fn subscribe(&self) -> watch::Receiver<usize> {
        self.index.subscribe()
    }

    /// Stop auto-advancing. Also happens on drop.
    pub fn close(&self) {
        self.cancel.cancel();
    }
}

impl Drop for Slideshow {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn advance_task(
    len: usize,
    index: Arc<watch::Sender<usize>>,
    reset: Arc<Notify>,
    period: Duration,
    cancel: CancellationToken,
) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval.tick().await;

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            () = reset.notified() => interval.reset(),
            _ = interval.tick() => index.send_modify(|i| *i = (*i + 1) % len),
        }
    }
}

#[cfg(test)]
mod tests {
    use tokio::time::sleep;

    use vandash_api::FileKind;

    use super::*;

    fn image(name: &str) -> FileItem {
        FileItem {
            name: name.into(),
            kind: FileKind::File,
            size: None,
            modified: None,
            path: name.into(),
            locked: false,
        }
    }

    async fn settle() {
        for _ in 0..5 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn advances_and_wraps() {
        let show = Slideshow::open(
            vec![image("a.jpg"), image("b.jpg")],
            1,
            Duration::from_secs(5),
        )
        .unwrap_or_else(|| panic!("slideshow should open"));
        settle().await;
        assert_eq!(show.index(), 1);

        sleep(Duration::from_millis(5_001)).await;
        assert_eq!(show.index(), 0);
        assert_eq!(show.current().map(|i| i.name.as_str()), Some("a.jpg"));

        show.prev();
        assert_eq!(show.index(), 1);

        show.close();
        sleep(Duration::from_secs(20)).await;
        assert_eq!(show.index(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn manual_step_restarts_period() {
        let show = Slideshow::open(
            vec![image("a.jpg"), image("b.jpg"), image("c.jpg")],
            0,
            Duration::from_secs(5),
        )
        .unwrap_or_else(|| panic!("slideshow should open"));
        settle().await;

        sleep(Duration::from_secs(4)).await;
        show.next();
        settle().await;
        assert_eq!(show.index(), 1);

        // The old deadline (5s) has passed; the restarted one (9s) has not.
        sleep(Duration::from_secs(3)).await;
        assert_eq!(show.index(), 1);
        sleep(Duration::from_millis(2_001)).await;
        assert_eq!(show.index(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_period_disables_auto_advance() {
        let show = Slideshow::open(vec![image("a.jpg"), image("b.jpg")], 0, Duration::ZERO)
            .unwrap_or_else(|| panic!("slideshow should open"));
        sleep(Duration::from_secs(60)).await;
        assert_eq!(show.index(), 0);

        show.next();
        assert_eq!(show.index(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn empty_folder_has_no_slideshow() {
        assert!(Slideshow::open(Vec::new(), 0, Duration::from_secs(5)).is_none());
    }
}
