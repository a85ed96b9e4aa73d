//! Production adapter: the web client runs in a child process (typically a
//! small script around a headless-browser WhatsApp Web library) and talks to
//! us over newline-delimited JSON on stdin/stdout.
//!
//! Requests carry an `id` echoed back by the reply:
//!
//! ```text
//! -> {"id":1,"method":"send_message","params":{"to":"628123@c.us","body":"hi"}}
//! <- {"id":1,"result":{"id":"3EB0..."}}
//! <- {"id":2,"error":"Evaluation failed"}
//! ```
//!
//! Lifecycle events are unsolicited lines:
//!
//! ```text
//! <- {"event":"qr","data":"2@abc..."}
//! <- {"event":"ready"}
//! ```

use super::{EventHandler, EventHandlers, MessagingClient, SendResponse};
use crate::error::{BridgeError, Error};
use crate::events::Event;
use crate::types::Jid;
use crate::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Browser launch flags that keep headless Chromium working inside containers.
pub const DEFAULT_BROWSER_ARGS: &[&str] = &[
    "--no-sandbox",
    "--disable-setuid-sandbox",
    "--disable-dev-shm-usage",
    "--disable-accelerated-2d-canvas",
    "--no-first-run",
    "--no-zygote",
    "--disable-gpu",
];

/// How long `destroy` waits for the bridge to acknowledge before killing it.
const DESTROY_GRACE: Duration = Duration::from_secs(10);

/// Browser settings forwarded to the bridge on `initialize`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BrowserOptions {
    pub headless: bool,
    pub args: Vec<String>,
}

impl Default for BrowserOptions {
    fn default() -> Self {
        Self {
            headless: true,
            args: DEFAULT_BROWSER_ARGS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// How to launch the bridge process.
#[derive(Clone, Debug)]
pub struct BridgeOptions {
    /// Executable to run.
    pub program: String,
    pub args: Vec<String>,
    /// Directory where the web client keeps its session (opaque to us).
    pub auth_dir: PathBuf,
    pub browser: BrowserOptions,
}

impl BridgeOptions {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            auth_dir: PathBuf::from(".wwebjs_auth"),
            browser: BrowserOptions::default(),
        }
    }
}

#[derive(Serialize)]
struct Request<'a> {
    id: u64,
    method: &'a str,
    params: Value,
}

#[derive(Debug, Deserialize)]
struct Reply {
    id: u64,
    #[serde(default)]
    result: Value,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
enum WireEvent {
    Qr(String),
    Authenticated,
    AuthFailure(String),
    Ready,
    Disconnected(String),
}

impl From<WireEvent> for Event {
    fn from(evt: WireEvent) -> Self {
        match evt {
            WireEvent::Qr(code) => Event::Qr { code },
            WireEvent::Authenticated => Event::Authenticated,
            WireEvent::AuthFailure(message) => Event::AuthFailure { message },
            WireEvent::Ready => Event::Ready,
            WireEvent::Disconnected(reason) => Event::Disconnected { reason },
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Incoming {
    Reply(Reply),
    Event(WireEvent),
}

type Pending = Arc<Mutex<HashMap<u64, oneshot::Sender<Reply>>>>;

struct BridgeProcess {
    child: Child,
    stdin: ChildStdin,
    reader: JoinHandle<()>,
}

/// Messaging client hosted in a child process.
pub struct BridgeClient {
    options: BridgeOptions,
    handlers: EventHandlers,
    pending: Pending,
    next_id: AtomicU64,
    closing: Arc<AtomicBool>,
    process: tokio::sync::Mutex<Option<BridgeProcess>>,
}

impl BridgeClient {
    pub fn new(options: BridgeOptions) -> Self {
        Self {
            options,
            handlers: EventHandlers::new(),
            pending: Arc::new(Mutex::new(HashMap::new())),
            next_id: AtomicU64::new(1),
            closing: Arc::new(AtomicBool::new(false)),
            process: tokio::sync::Mutex::new(None),
        }
    }

    pub fn options(&self) -> &BridgeOptions {
        &self.options
    }

    fn spawn(&self) -> Result<(Child, ChildStdin, ChildStdout)> {
        let mut child = Command::new(&self.options.program)
            .args(&self.options.args)
            .env("WHATSAPP_AUTH_DIR", &self.options.auth_dir)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| BridgeError::Spawn {
                program: self.options.program.clone(),
                message: e.to_string(),
            })?;

        let stdin = child.stdin.take().ok_or(BridgeError::MissingPipe("stdin"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or(BridgeError::MissingPipe("stdout"))?;
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    debug!("bridge stderr: {}", line);
                }
            });
        }
        Ok((child, stdin, stdout))
    }

    async fn call(&self, method: &str, params: Value) -> Result<Value> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let mut line = serde_json::to_vec(&Request { id, method, params })?;
        line.push(b'\n');

        let (tx, rx) = oneshot::channel();
        lock(&self.pending).insert(id, tx);

        let written = {
            let mut process = self.process.lock().await;
            match process.as_mut() {
                Some(p) => write_line(&mut p.stdin, &line).await,
                None => Err(Error::NotInitialized),
            }
        };
        if let Err(e) = written {
            lock(&self.pending).remove(&id);
            return Err(e);
        }
        debug!(id, method, "bridge request sent");

        let reply = rx.await.map_err(|_| BridgeError::Closed)?;
        match reply.error {
            Some(message) => Err(Error::client(message)),
            None => Ok(reply.result),
        }
    }
}

async fn write_line(stdin: &mut ChildStdin, line: &[u8]) -> Result<()> {
    stdin
        .write_all(line)
        .await
        .map_err(|_| BridgeError::Closed)?;
    stdin.flush().await.map_err(|_| BridgeError::Closed)?;
    Ok(())
}

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

async fn handle_line(line: &str, pending: &Pending, handlers: &EventHandlers) {
    let line = line.trim();
    if line.is_empty() {
        return;
    }
    match serde_json::from_str::<Incoming>(line) {
        Ok(Incoming::Reply(reply)) => {
            let waiter = lock(pending).remove(&reply.id);
            match waiter {
                Some(tx) => {
                    let _ = tx.send(reply);
                }
                None => debug!(id = reply.id, "reply for unknown request"),
            }
        }
        Ok(Incoming::Event(evt)) => handlers.dispatch(evt.into()).await,
        Err(e) => warn!(error = %e, "ignoring malformed bridge line"),
    }
}

async fn read_loop(
    stdout: ChildStdout,
    pending: Pending,
    handlers: EventHandlers,
    closing: Arc<AtomicBool>,
) {
    let mut lines = BufReader::new(stdout).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => handle_line(&line, &pending, &handlers).await,
            Ok(None) => break,
            Err(e) => {
                warn!(error = %e, "bridge read failed");
                break;
            }
        }
    }

    // Dropping the senders fails every in-flight call with `Closed`.
    lock(&pending).clear();
    if !closing.load(Ordering::SeqCst) {
        handlers
            .dispatch(Event::Disconnected {
                reason: "bridge process exited".to_string(),
            })
            .await;
    }
}

#[async_trait]
impl MessagingClient for BridgeClient {
    async fn add_event_handler(&self, handler: EventHandler) {
        self.handlers.add(handler).await;
    }

    async fn initialize(&self) -> Result<()> {
        {
            let mut process = self.process.lock().await;
            if process.is_some() {
                warn!("bridge already running, ignoring initialize");
                return Ok(());
            }
            let (child, stdin, stdout) = self.spawn()?;
            info!(
                program = %self.options.program,
                pid = child.id().unwrap_or_default(),
                "bridge process started"
            );
            self.closing.store(false, Ordering::SeqCst);
            let reader = tokio::spawn(read_loop(
                stdout,
                Arc::clone(&self.pending),
                self.handlers.clone(),
                Arc::clone(&self.closing),
            ));
            *process = Some(BridgeProcess {
                child,
                stdin,
                reader,
            });
        }

        self.call(
            "initialize",
            json!({
                "auth_dir": self.options.auth_dir,
                "headless": self.options.browser.headless,
                "browser_args": self.options.browser.args,
            }),
        )
        .await?;
        Ok(())
    }

    async fn is_registered_user(&self, id: &Jid) -> Result<bool> {
        let result = self.call("is_registered_user", json!({ "id": id })).await?;
        result.as_bool().ok_or_else(|| {
            BridgeError::Protocol(format!("is_registered_user returned {}", result)).into()
        })
    }

    async fn send_message(&self, to: &Jid, body: &str) -> Result<SendResponse> {
        let result = self
            .call("send_message", json!({ "to": to, "body": body }))
            .await?;
        let id = result
            .get("id")
            .and_then(Value::as_str)
            .map(str::to_string);
        Ok(SendResponse::new(id))
    }

    async fn logout(&self) -> Result<()> {
        self.call("logout", json!({})).await?;
        Ok(())
    }

    async fn destroy(&self) -> Result<()> {
        if self.process.lock().await.is_none() {
            return Ok(());
        }
        self.closing.store(true, Ordering::SeqCst);

        match tokio::time::timeout(DESTROY_GRACE, self.call("destroy", json!({}))).await {
            Ok(Ok(_)) => debug!("bridge acknowledged destroy"),
            Ok(Err(e)) => warn!(error = %e, "bridge destroy failed"),
            Err(_) => warn!("bridge did not acknowledge destroy in time"),
        }

        if let Some(mut process) = self.process.lock().await.take() {
            let _ = process.child.kill().await;
            process.reader.abort();
            info!("bridge process stopped");
        }
        // The aborted reader never reaches its own cleanup.
        lock(&self.pending).clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[test]
    fn parses_replies_and_events() {
        let reply: Incoming = serde_json::from_str(r#"{"id":7,"result":true}"#).unwrap();
        assert!(matches!(reply, Incoming::Reply(Reply { id: 7, .. })));

        let failed: Incoming =
            serde_json::from_str(r#"{"id":8,"error":"Evaluation failed"}"#).unwrap();
        match failed {
            Incoming::Reply(r) => assert_eq!(r.error.as_deref(), Some("Evaluation failed")),
            other => panic!("unexpected {:?}", other),
        }

        let qr: Incoming = serde_json::from_str(r#"{"event":"qr","data":"2@abc"}"#).unwrap();
        match qr {
            Incoming::Event(evt) => assert_eq!(
                Event::from(evt),
                Event::Qr {
                    code: "2@abc".into()
                }
            ),
            other => panic!("unexpected {:?}", other),
        }

        let ready: Incoming = serde_json::from_str(r#"{"event":"ready"}"#).unwrap();
        assert!(matches!(ready, Incoming::Event(WireEvent::Ready)));
    }

    #[test]
    fn default_browser_is_headless_with_sandbox_flags() {
        let browser = BrowserOptions::default();
        assert!(browser.headless);
        assert!(browser.args.iter().any(|a| a == "--no-sandbox"));
        assert_eq!(browser.args.len(), DEFAULT_BROWSER_ARGS.len());
    }

    #[tokio::test]
    async fn calls_before_initialize_fail() {
        let client = BridgeClient::new(BridgeOptions::new("unused"));
        let err = client.logout().await.unwrap_err();
        assert!(matches!(err, Error::NotInitialized));
        // Nothing to tear down yet.
        client.destroy().await.unwrap();
    }

    #[tokio::test]
    async fn spawn_failure_is_reported() {
        let client = BridgeClient::new(BridgeOptions::new("/nonexistent/whatsapp-bridge"));
        let err = client.initialize().await.unwrap_err();
        assert!(matches!(err, Error::Bridge(BridgeError::Spawn { .. })));
    }

    #[cfg(unix)]
    fn shell_bridge(script: &str) -> BridgeClient {
        let mut options = BridgeOptions::new("sh");
        options.args = vec!["-c".to_string(), script.to_string()];
        BridgeClient::new(options)
    }

    #[cfg(unix)]
    async fn event_channel(client: &BridgeClient) -> mpsc::UnboundedReceiver<Event> {
        let (tx, rx) = mpsc::unbounded_channel();
        client
            .add_event_handler(Box::new(move |evt| {
                let _ = tx.send(evt);
            }))
            .await;
        rx
    }

    #[cfg(unix)]
    async fn next_event(rx: &mut mpsc::UnboundedReceiver<Event>) -> Event {
        tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("event in time")
            .expect("channel open")
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn initialize_forwards_events() {
        let client = shell_bridge(
            r#"read line; printf '{"event":"qr","data":"2@abc"}\n{"id":1,"result":null}\n{"event":"authenticated"}\n{"event":"ready"}\n'; read line; printf '{"id":2,"result":null}\n'; cat > /dev/null"#,
        );
        let mut events = event_channel(&client).await;

        client.initialize().await.unwrap();
        assert_eq!(
            next_event(&mut events).await,
            Event::Qr {
                code: "2@abc".into()
            }
        );
        assert_eq!(next_event(&mut events).await, Event::Authenticated);
        assert_eq!(next_event(&mut events).await, Event::Ready);

        client.destroy().await.unwrap();
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn error_reply_is_passed_through() {
        let client = shell_bridge(
            r#"read line; printf '{"id":1,"error":"Failed to launch the browser process"}\n'; read line; printf '{"id":2,"result":null}\n'; cat > /dev/null"#,
        );
        let err = client.initialize().await.unwrap_err();
        assert_eq!(err.to_string(), "Failed to launch the browser process");
        client.destroy().await.unwrap();
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn destroy_fails_inflight_calls() {
        // Answers initialize (id 1), leaves logout (id 2) hanging, acks destroy (id 3).
        let client = Arc::new(shell_bridge(
            r#"read line; printf '{"id":1,"result":null}\n'; read line; read line; printf '{"id":3,"result":null}\n'; cat > /dev/null"#,
        ));
        client.initialize().await.unwrap();

        let inflight = {
            let client = Arc::clone(&client);
            tokio::spawn(async move { client.logout().await })
        };
        tokio::time::sleep(Duration::from_millis(100)).await;

        client.destroy().await.unwrap();
        let result = tokio::time::timeout(Duration::from_secs(3), inflight)
            .await
            .expect("in-flight call settles after destroy")
            .unwrap();
        assert!(matches!(result, Err(Error::Bridge(BridgeError::Closed))));
        assert!(lock(&client.pending).is_empty());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn exit_fails_pending_calls_and_disconnects() {
        let client = shell_bridge("read line; exit 0");
        let mut events = event_channel(&client).await;

        let err = client.initialize().await.unwrap_err();
        assert!(matches!(err, Error::Bridge(BridgeError::Closed)));
        assert!(matches!(
            next_event(&mut events).await,
            Event::Disconnected { .. }
        ));
    }
}
