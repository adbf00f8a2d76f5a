// src/server/reload.rs

//! Reload notifications: the broadcast hub tasks publish into, and the
//! browser client that listens for them.

use tokio::sync::broadcast;
use tracing::debug;

use crate::types::ReloadNotice;

/// Fan-out point between finished tasks and connected browsers.
///
/// Cloning yields another handle to the same channel.
#[derive(Debug, Clone)]
pub struct ReloadHub {
    tx: broadcast::Sender<ReloadNotice>,
}

impl ReloadHub {
    /// Notices buffered per slow client before it starts skipping.
    const CAPACITY: usize = 64;

    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(Self::CAPACITY);
        Self { tx }
    }

    /// Send `notice` to every connected client; returns how many received it.
    pub fn publish(&self, notice: ReloadNotice) -> usize {
        match self.tx.send(notice) {
            Ok(receivers) => {
                debug!(receivers, "reload notice published");
                receivers
            }
            // No browser connected.
            Err(_) => 0,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ReloadNotice> {
        self.tx.subscribe()
    }
}

impl Default for ReloadHub {
    fn default() -> Self {
        Self::new()
    }
}

/// Script served at [`CLIENT_PATH`](super::CLIENT_PATH).
pub const CLIENT_JS: &str = r#"(function () {
  var source = new EventSource("/__sitepipe/events");
  source.addEventListener("reload", function (event) {
    var notice = JSON.parse(event.data);
    if (notice.kind !== "css") {
      window.location.reload();
      return;
    }
    var links = document.querySelectorAll('link[rel="stylesheet"]');
    for (var i = 0; i < links.length; i++) {
      var url = new URL(links[i].href);
      url.searchParams.set("__sitepipe", Date.now());
      links[i].href = url.toString();
    }
  });
})();
"#;

/// Tag inserted into served HTML pages.
pub fn client_tag() -> String {
    format!(r#"<script src="{}"></script>"#, super::CLIENT_PATH)
}

/// Insert the client tag before the last `</body>`, or append it when the
/// page has none.
pub fn inject_client(html: &str) -> String {
    let tag = client_tag();
    match html.to_ascii_lowercase().rfind("</body>") {
        Some(at) => {
            let mut out = String::with_capacity(html.len() + tag.len());
            out.push_str(&html[..at]);
            out.push_str(&tag);
            out.push_str(&html[at..]);
            out
        }
        None => format!("{html}{tag}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ReloadKind;

    #[test]
    fn injects_before_closing_body() {
        let html = "<html><BODY><p>hi</p></Body></html>";
        assert_eq!(
            inject_client(html),
            r#"<html><BODY><p>hi</p><script src="/__sitepipe/reload.js"></script></Body></html>"#
        );
    }

    #[test]
    fn appends_when_body_is_missing() {
        assert!(inject_client("<p>fragment</p>").ends_with("</p><script src=\"/__sitepipe/reload.js\"></script>"));
    }

    #[tokio::test]
    async fn publish_reaches_every_subscriber() {
        let hub = ReloadHub::new();
        assert_eq!(hub.publish(notice()), 0);

        let mut a = hub.subscribe();
        let mut b = hub.clone().subscribe();
        assert_eq!(hub.publish(notice()), 2);
        assert_eq!(a.recv().await.unwrap(), notice());
        assert_eq!(b.recv().await.unwrap(), notice());
    }

    fn notice() -> ReloadNotice {
        ReloadNotice {
            task: "views".to_string(),
            kind: ReloadKind::Full,
            paths: vec!["index.html".to_string()],
        }
    }
}
