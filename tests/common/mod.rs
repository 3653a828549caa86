//! Utility code to help writing daily-notify tests.

use std::collections::HashMap;
use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpStream;
use std::net::{SocketAddr, TcpListener};
use std::sync::{Arc, Mutex};

use daily_notify::config::{Config, ConfigFile};
use reqwest::Client;
use url::Url;

/// The callback type for HTTP route handlers.
pub type RequestCallback = Box<dyn Send + Fn(Request) -> Response>;

pub const WEATHER_PATH: &str = "/api/v1/rest/datastore/F-C0032-001";
pub const SLACK_PATH: &str = "/services/T000/B000/XXXX";

/// HTTP method.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Method {
    GET,
    POST,
}

impl Method {
    fn from_str(s: &str) -> Method {
        match s {
            "GET" => Method::GET,
            "POST" => Method::POST,
            _ => panic!("unexpected HTTP method {s}"),
        }
    }
}

/// A builder for preparing a test.
///
/// Every endpoint the crate talks to is pointed at a local HTTP server, and
/// every credential is set to a dummy value unless removed with
/// [`TestBuilder::unset`].
pub struct TestBuilder {
    pub config: Option<&'static str>,
    pub handlers: HashMap<(Method, &'static str), RequestCallback>,
    pub env: Vec<(&'static str, String)>,
    pub unset: Vec<&'static str>,
}

impl Default for TestBuilder {
    fn default() -> Self {
        TestBuilder {
            config: None,
            handlers: HashMap::new(),
            env: Vec::new(),
            unset: Vec::new(),
        }
    }
}

/// A running test: the mock server and a configuration that targets it.
pub struct TestContext {
    pub config: Config,
    pub client: Client,
    pub events: Events,
    // Held for its drop, which stops the server.
    server: HttpServerHandle,
}

impl TestContext {
    /// Address of the mock server.
    pub fn addr(&self) -> std::net::SocketAddr {
        self.server.addr
    }
}

/// A request received on the HTTP server.
#[derive(Clone, Debug)]
pub struct Request {
    /// The path of the request, such as `index/GI/DJI`.
    pub path: String,
    /// The HTTP method.
    pub method: Method,
    /// Components in the path that were captured with the `{foo}` syntax.
    /// See [`TestBuilder::handler`] for details.
    pub components: HashMap<String, String>,
    /// The query components of the URL (the stuff after `?`).
    pub query: Vec<(String, String)>,
    /// HTTP headers, with lowercase names.
    pub headers: HashMap<String, String>,
    /// The body of the HTTP request.
    pub body: Vec<u8>,
}

impl Request {
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).unwrap()
    }

    /// Decodes an `application/x-www-form-urlencoded` body.
    pub fn form(&self) -> HashMap<String, String> {
        url::form_urlencoded::parse(&self.body)
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(|v| v.as_str())
    }
}

/// The response the HTTP server should send to the client.
pub struct Response {
    pub code: u32,
    pub headers: Vec<String>,
    pub body: Vec<u8>,
}

impl Response {
    pub fn new() -> Response {
        Response {
            code: 200,
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    pub fn new_from_path(path: &str) -> Response {
        Response {
            code: 200,
            headers: vec!["Content-Type: application/json".to_string()],
            body: std::fs::read(path).unwrap(),
        }
    }

    pub fn code(mut self, code: u32) -> Self {
        self.code = code;
        self
    }

    pub fn body(mut self, body: &[u8]) -> Self {
        self.body = Vec::from(body);
        self
    }
}

/// A recording of HTTP requests which can then be validated they are
/// performed in the correct order.
#[derive(Clone)]
pub struct Events(Arc<Mutex<Vec<(Method, String)>>>);

impl Events {
    pub fn new() -> Events {
        Events(Arc::new(Mutex::new(Vec::new())))
    }

    fn push(&self, method: Method, path: String) {
        let mut es = self.0.lock().unwrap();
        es.push((method, path));
    }

    pub fn assert_eq(&self, expected: &[(Method, &str)]) {
        let es = self.0.lock().unwrap();
        for (actual, expected) in es.iter().zip(expected.iter()) {
            if actual.0 != expected.0 || actual.1 != expected.1 {
                panic!("expected request to {expected:?}, but next event was {actual:?}");
            }
        }
        if es.len() > expected.len() {
            panic!(
                "got unexpected extra requests, \
                make sure the event assertion lists all events\n\
                Extras are: {:?} ",
                &es[expected.len()..]
            );
        } else if es.len() < expected.len() {
            panic!(
                "expected additional requests that were never made, \
                make sure the event assertion lists the correct requests\n\
                Extra expected are: {:?}",
                &expected[es.len()..]
            );
        }
    }
}

/// A primitive HTTP server.
pub struct HttpServer {
    listener: TcpListener,
    /// Handlers to call for specific routes.
    handlers: HashMap<(Method, &'static str), RequestCallback>,
    /// A recording of all requests.
    events: Events,
}

/// A reference on how to connect to the test HTTP server.
pub struct HttpServerHandle {
    pub addr: SocketAddr,
}

impl Drop for HttpServerHandle {
    fn drop(&mut self) {
        if let Ok(mut stream) = TcpStream::connect(self.addr) {
            // shut down the server
            let _ = stream.write_all(b"STOP");
            let _ = stream.flush();
        }
    }
}

impl TestBuilder {
    /// Sets the contents of the TOML configuration file.
    pub fn config(mut self, config: &'static str) -> Self {
        self.config = Some(config);
        self
    }

    /// Adds an HTTP handler.
    ///
    /// The `path` is the route, like `index/GI/DJI`. A generic route can be
    /// configured using curly braces. For example, to get all quote pages,
    /// use a path like `index/GI/{symbol}`. The value of the path component
    /// can be found in [`Request::components`].
    ///
    /// If the path ends with `{...}`, then this means "the rest of the path".
    /// The rest of the path can be obtained from the `...` value in the
    /// `Request::components` map.
    pub fn handler<R: 'static + Send + Fn(Request) -> Response>(
        mut self,
        method: Method,
        path: &'static str,
        responder: R,
    ) -> Self {
        self.handlers.insert((method, path), Box::new(responder));
        self
    }

    /// Overrides the environment variable `name`.
    pub fn env(mut self, name: &'static str, value: &str) -> Self {
        self.env.push((name, value.to_string()));
        self
    }

    /// Leaves the environment variable `name` unset.
    pub fn unset(mut self, name: &'static str) -> Self {
        self.unset.push(name);
        self
    }

    /// Enables logging if `DAILY_NOTIFY_TEST_LOG` is set. This can help with
    /// debugging a test.
    pub fn maybe_enable_logging(&self) {
        const LOG_VAR: &str = "DAILY_NOTIFY_TEST_LOG";
        use std::sync::Once;
        static DO_INIT: Once = Once::new();
        if std::env::var_os(LOG_VAR).is_some() {
            DO_INIT.call_once(|| {
                dotenvy::dotenv().ok();
                tracing_subscriber::fmt::Subscriber::builder()
                    .with_env_filter(tracing_subscriber::EnvFilter::from_env(LOG_VAR))
                    .with_ansi(std::env::var_os("DISABLE_COLOR").is_none())
                    .try_init()
                    .unwrap();
            });
        }
    }

    pub fn build(self) -> TestContext {
        self.maybe_enable_logging();
        let events = Events::new();
        let server = HttpServer::new(self.handlers, events.clone());
        let base = format!("http://{}", server.addr);

        let mut env: HashMap<&str, String> = HashMap::from([
            ("QUOTE_BASE_URL", base.clone()),
            ("CWA_API_URL", format!("{base}{WEATHER_PATH}")),
            ("LINE_NOTIFY_URL", format!("{base}/api/notify")),
            ("LINE_API_URL", base.clone()),
            ("SLACK_WEBHOOK", format!("{base}{SLACK_PATH}")),
            ("LINE_NOTIFY_TOKEN", "notify-token".to_string()),
            ("LINE_BOT_TOKEN", "bot-token".to_string()),
            ("LINE_USER_ID", "U0123456789".to_string()),
            ("CWA_API_KEY", "CWA-TEST-KEY".to_string()),
            ("HTTP_TIMEOUT_SECS", "5".to_string()),
        ]);
        env.extend(self.env);
        for name in &self.unset {
            env.remove(name);
        }

        let file = match self.config {
            Some(config) => toml::from_str::<ConfigFile>(config).unwrap(),
            None => ConfigFile::default(),
        };
        let config = Config::from_lookup(file, |key| env.get(key).cloned()).unwrap();
        let client = daily_notify::http_client::build_client(config.http_timeout).unwrap();
        TestContext {
            config,
            client,
            events,
            server,
        }
    }
}

impl HttpServer {
    pub fn new(
        handlers: HashMap<(Method, &'static str), RequestCallback>,
        events: Events,
    ) -> HttpServerHandle {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let server = HttpServer {
            listener,
            handlers,
            events,
        };
        std::thread::spawn(move || server.start());
        HttpServerHandle { addr }
    }

    fn start(&self) {
        let mut line = String::new();
        'server: loop {
            let (socket, _) = self.listener.accept().unwrap();
            let mut buf = BufReader::new(socket);
            line.clear();
            if buf.read_line(&mut line).unwrap() == 0 {
                // Connection terminated.
                eprintln!("unexpected client drop");
                continue;
            }
            // Read the "GET path HTTP/1.1" line.
            let mut parts = line.split_ascii_whitespace();
            let method = parts.next().unwrap().to_ascii_uppercase();
            if method == "STOP" {
                // Shutdown the server.
                return;
            }
            let path = parts.next().unwrap();
            // The host here doesn't matter, we're just interested in parsing
            // the path and query string.
            let url = Url::parse(&format!("http://localhost{path}")).unwrap();

            let mut headers = HashMap::new();
            let mut content_len = None;
            loop {
                line.clear();
                if buf.read_line(&mut line).unwrap() == 0 {
                    continue 'server;
                }
                if line == "\r\n" {
                    // End of headers.
                    line.clear();
                    break;
                }
                let (name, value) = line.split_once(':').unwrap();
                let name = name.trim().to_ascii_lowercase();
                let value = value.trim().to_string();
                if name == "content-length" {
                    content_len = Some(value.parse::<u64>().unwrap());
                }
                headers.insert(name, value);
            }
            let mut body = vec![0u8; content_len.unwrap_or(0) as usize];
            buf.read_exact(&mut body).unwrap();

            let method = Method::from_str(&method);
            self.events.push(method, url.path().to_string());
            let response = self.route(method, &url, headers, body);

            let buf = buf.get_mut();
            write!(buf, "HTTP/1.1 {}\r\n", response.code).unwrap();
            write!(buf, "Content-Length: {}\r\n", response.body.len()).unwrap();
            write!(buf, "Connection: close\r\n").unwrap();
            for header in response.headers {
                write!(buf, "{}\r\n", header).unwrap();
            }
            write!(buf, "\r\n").unwrap();
            buf.write_all(&response.body).unwrap();
            buf.flush().unwrap();
        }
    }

    /// Route the request
    fn route(
        &self,
        method: Method,
        url: &Url,
        headers: HashMap<String, String>,
        body: Vec<u8>,
    ) -> Response {
        eprintln!("route {method:?} {}", url.path());
        let query = url
            .query_pairs()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let segments: Vec<_> = url.path_segments().unwrap().collect();
        let path = url.path().to_string();
        for ((route_method, route_pattern), responder) in &self.handlers {
            if *route_method != method {
                continue;
            }
            if let Some(components) = match_route(route_pattern, &segments) {
                let request = Request {
                    method,
                    path,
                    query,
                    components,
                    headers,
                    body,
                };
                tracing::debug!("request={request:?}");
                return responder(request);
            }
        }
        eprintln!(
            "route {method:?} {} has no handler.\n\
            Add a handler to the context for this route.",
            url.path()
        );
        Response {
            code: 404,
            headers: Vec::new(),
            body: b"404 not found".to_vec(),
        }
    }
}

fn match_route(route_pattern: &str, segments: &[&str]) -> Option<HashMap<String, String>> {
    let mut segments = segments.iter();
    let mut components = HashMap::new();
    for part in route_pattern.split('/') {
        if part == "{...}" {
            let rest: Vec<_> = segments.copied().collect();
            components.insert("...".to_string(), rest.join("/"));
            return Some(components);
        }
        match segments.next() {
            None => return None,
            Some(actual) => {
                if part.starts_with('{') {
                    let part = part[1..part.len() - 1].to_string();
                    components.insert(part, actual.to_string());
                } else if *actual != part {
                    return None;
                }
            }
        }
    }
    if segments.next().is_some() {
        return None;
    }
    Some(components)
}

/// A quote page carrying the fields the default selectors look for.
pub fn quote_page(date: &str, price: &str, change: &str, percent: &str) -> Vec<u8> {
    format!(
        r#"<html><body>
        <div class="_zFXfK">{date} 16:00 收盤</div>
        <div class="jsx-2214436525 info-price">{price}</div>
        <div class="jsx-2214436525 change-net">{change}</div>
        <div class="jsx-2214436525 change-percent">{percent}</div>
        </body></html>"#
    )
    .into_bytes()
}

/// Keeps the requests seen by a handler so the test can inspect them once
/// the call under test has returned.
#[derive(Clone, Default)]
pub struct Captured(Arc<Mutex<Vec<Request>>>);

impl Captured {
    /// A handler that records the request and answers with `code` and `body`.
    pub fn responder(
        &self,
        code: u32,
        body: &'static str,
    ) -> impl Fn(Request) -> Response + Send + use<> {
        let captured = self.clone();
        move |req| {
            captured.0.lock().unwrap().push(req);
            Response::new().code(code).body(body.as_bytes())
        }
    }

    pub fn requests(&self) -> Vec<Request> {
        self.0.lock().unwrap().clone()
    }

    /// The single request the handler saw.
    pub fn only(&self) -> Request {
        let requests = self.requests();
        assert_eq!(requests.len(), 1, "expected exactly one request");
        requests.into_iter().next().unwrap()
    }
}
