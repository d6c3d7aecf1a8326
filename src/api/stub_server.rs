// ============================================================================
// Serveur HTTP de test
// ============================================================================
// Petit serveur HTTP/1.1 sur 127.0.0.1 (port choisi par l'OS) qui répond
// selon une closure fournie par le test : statut, corps, délai.
// Chaque requête reçue est enregistrée ("GET /api/exchanges") pour que
// les tests puissent vérifier ce qui a (ou n'a pas) été envoyé.
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

/// Réponse renvoyée par le serveur de test
#[derive(Debug, Clone)]
pub struct StubResponse {
    pub status: u16,
    pub body: String,
    pub delay: Duration,
}

impl StubResponse {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
            delay: Duration::ZERO,
        }
    }

    pub fn status(status: u16) -> Self {
        Self {
            status,
            body: r#"{"detail":"stub error"}"#.to_string(),
            delay: Duration::ZERO,
        }
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

type Route = Arc<dyn Fn(&str, &str, &str) -> StubResponse + Send + Sync>;

#[derive(Default)]
struct Recorded {
    requests: Vec<String>,
    bodies: Vec<String>,
}

/// Serveur arrêté automatiquement au drop
pub struct StubServer {
    pub base_url: String,
    recorded: Arc<Mutex<Recorded>>,
    task: JoinHandle<()>,
}

impl StubServer {
    /// Démarre le serveur ; `route(method, path, body)` décide de la réponse
    pub async fn start<F>(route: F) -> Self
    where
        F: Fn(&str, &str, &str) -> StubResponse + Send + Sync + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let route: Route = Arc::new(route);
        let recorded = Arc::new(Mutex::new(Recorded::default()));

        let task = {
            let recorded = recorded.clone();
            tokio::spawn(async move {
                loop {
                    let Ok((stream, _)) = listener.accept().await else {
                        break;
                    };
                    let route = route.clone();
                    let recorded = recorded.clone();
                    tokio::spawn(async move {
                        let _ = serve(stream, route, recorded).await;
                    });
                }
            })
        };

        Self {
            base_url: format!("http://{}", addr),
            recorded,
            task,
        }
    }

    /// Requêtes reçues, dans l'ordre ("METHOD /path")
    pub fn requests(&self) -> Vec<String> {
        self.recorded.lock().requests.clone()
    }

    /// Corps des requêtes reçues
    pub fn bodies(&self) -> Vec<String> {
        self.recorded.lock().bodies.clone()
    }
}

impl Drop for StubServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// URL d'un port local sur lequel plus personne n'écoute
pub async fn unreachable_base_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

async fn serve(stream: TcpStream, route: Route, recorded: Arc<Mutex<Recorded>>) -> std::io::Result<()> {
    let mut reader = BufReader::new(stream);

    let mut request_line = String::new();
    reader.read_line(&mut request_line).await?;
    let mut parts = request_line.split_whitespace();
    let method = parts.next().unwrap_or_default().to_string();
    let path = parts.next().unwrap_or_default().to_string();

    let mut content_length = 0usize;
    loop {
        let mut header = String::new();
        if reader.read_line(&mut header).await? == 0 {
            break;
        }
        let header = header.trim_end();
        if header.is_empty() {
            break;
        }
        if let Some((name, value)) = header.split_once(':') {
            if name.eq_ignore_ascii_case("content-length") {
                content_length = value.trim().parse().unwrap_or(0);
            }
        }
    }

    let mut body = vec![0u8; content_length];
    reader.read_exact(&mut body).await?;
    let body = String::from_utf8_lossy(&body).to_string();

    {
        let mut recorded = recorded.lock();
        recorded.requests.push(format!("{} {}", method, path));
        recorded.bodies.push(body.clone());
    }

    let response = route(&method, &path, &body);
    if !response.delay.is_zero() {
        tokio::time::sleep(response.delay).await;
    }

    let payload = format!(
        "HTTP/1.1 {} STUB\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        response.status,
        response.body.len(),
        response.body
    );
    let mut stream = reader.into_inner();
    stream.write_all(payload.as_bytes()).await?;
    stream.shutdown().await
}
