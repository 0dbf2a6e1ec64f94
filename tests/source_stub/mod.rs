use std::sync::mpsc;
use std::thread;
use std::time::Duration;

/// Serves a small syosetu-style novel:
/// - `/novel/` lists `ss1`, `697`, `698` (oldest first)
/// - `/broken/` lists `900`, whose chapter page returns 404
/// - `/paged/` lists `697`, `698` and links to `/paged/?p=2`, which lists
///   `698` again plus `699` and links to itself
pub struct SourceStub {
    pub base_url: String,
    shutdown_tx: Option<mpsc::Sender<()>>,
    handle: Option<thread::JoinHandle<()>>,
}

impl SourceStub {
    pub fn spawn() -> Self {
        let server = tiny_http::Server::http("127.0.0.1:0").expect("start source stub server");
        let addr = server.server_addr();
        let base_url = format!("http://{addr}");

        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();

        let handle = thread::spawn(move || {
            loop {
                if shutdown_rx.try_recv().is_ok() {
                    break;
                }

                let request = match server.recv_timeout(Duration::from_millis(50)) {
                    Ok(Some(req)) => req,
                    Ok(None) => continue,
                    Err(_) => break,
                };

                let url = request.url().to_string();
                let path = url.split('?').next().unwrap_or(&url);
                let (status, body) = match url.as_str() {
                    "/paged/" => (200, PAGED_LISTING_1.to_owned()),
                    "/paged/?p=2" => (200, PAGED_LISTING_2.to_owned()),
                    _ => route(path),
                };

                let mut response = tiny_http::Response::from_string(body).with_status_code(status);
                if status == 200 {
                    let header = tiny_http::Header::from_bytes(
                        &b"Content-Type"[..],
                        &b"text/html; charset=utf-8"[..],
                    )
                    .expect("build header");
                    response = response.with_header(header);
                }
                let _ = request.respond(response);
            }
        });

        Self {
            base_url,
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        }
    }
}

fn route(path: &str) -> (u16, String) {
    match path {
        "/novel/" => (200, NOVEL_LISTING.to_owned()),
        "/broken/" => (200, BROKEN_LISTING.to_owned()),
        "/novel/ss1/" => (200, chapter_html("幕間の本文")),
        "/novel/697/" => (200, chapter_html("六百九十七話の本文")),
        "/novel/698/" => (200, chapter_html("六百九十八話の本文")),
        _ => (404, "not found".to_owned()),
    }
}

impl Drop for SourceStub {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

const NOVEL_LISTING: &str = r#"<!doctype html>
<html>
<head><title>Re:ゼロから始める異世界生活</title></head>
<body>
<div class="index_box">
  <dl class="novel_sublist2">
    <dd class="subtitle"><a href="/novel/ss1/">幕間</a></dd>
    <dt class="long_update">2024/04/01 12:00</dt>
  </dl>
  <dl class="novel_sublist2">
    <dd class="subtitle"><a href="/novel/697/">第九章１</a></dd>
    <dt class="long_update">2024/05/10 21:00<span title="2024/05/11 改稿">（<u>改</u>）</span></dt>
  </dl>
  <dl class="novel_sublist2">
    <dd class="subtitle"><a href="/novel/698/">第九章２</a></dd>
    <dt class="long_update">2024/05/17 21:00</dt>
  </dl>
</div>
</body>
</html>
"#;

const BROKEN_LISTING: &str = r#"<!doctype html>
<html><body>
<dl class="novel_sublist2">
  <dd class="subtitle"><a href="/broken/900/">消えた話</a></dd>
  <dt class="long_update">2024/06/01 21:00</dt>
</dl>
</body></html>
"#;

const PAGED_LISTING_1: &str = r#"<!doctype html>
<html><body>
<div class="p-eplist">
  <div class="p-eplist__sublist">
    <a href="/paged/697/" class="p-eplist__subtitle">第九章１</a>
    <div class="p-eplist__update">2024/05/10 21:00</div>
  </div>
  <div class="p-eplist__sublist">
    <a href="/paged/698/" class="p-eplist__subtitle">第九章２</a>
    <div class="p-eplist__update">2024/05/17 21:00</div>
  </div>
</div>
<div class="c-pager">
  <a href="/paged/?p=2" class="c-pager__item c-pager__item--next">次へ</a>
</div>
</body></html>
"#;

const PAGED_LISTING_2: &str = r#"<!doctype html>
<html><body>
<div class="p-eplist">
  <div class="p-eplist__sublist">
    <a href="/paged/698/" class="p-eplist__subtitle">第九章２（再掲）</a>
    <div class="p-eplist__update">2024/05/18 21:00</div>
  </div>
  <div class="p-eplist__sublist">
    <a href="/paged/699/" class="p-eplist__subtitle">第九章３</a>
    <div class="p-eplist__update">2024/05/24 21:00</div>
  </div>
</div>
<div class="c-pager">
  <a href="/paged/?p=2" class="c-pager__item c-pager__item--next">次へ</a>
</div>
</body></html>
"#;

fn chapter_html(text: &str) -> String {
    format!(
        r#"<!doctype html>
<html><body>
<div id="novel_honbun" class="novel_view">
<p id="L1">{text}</p>
<p id="L2"><br /></p>
<p id="L3">「――終わり」</p>
</div>
</body></html>
"#
    )
}
