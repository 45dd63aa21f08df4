use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, mpsc};
use std::thread;
use std::time::Duration;

pub const TERMS_PAGE: &str = r#"<!doctype html>
<html><body><form>
<select name="term">
<!--  Display Term Choices -->
<option value="114-Fall 2025">Fall 2025</option>
<option value="115-Spr 2026">Spring 2026</option>
<!--  Display Career Choices -->
<option value="GRAD">Graduate</option>
</select>
</form></body></html>
"#;

pub const SUBJECTS_XML: &str = "<Response><SubjectList>\
<Subject>CIS</Subject><Subject>STA</Subject>\
</SubjectList></Response>";

pub const SEARCH_XML: &str = "<Response><ClassList><![CDATA[<table>\
<tr><td>Enrl.</td><td>Det.</td><td>ClassNr</td><td>Sect.</td><td>Begin Date - End Date</td>\
<td>Days</td><td>Time</td><td>Room</td><td>Instructor</td><td>Comp.</td><td>Stat.</td><td>Enrl/Tot</td></tr>\
<tr><td colspan=\"12\">CIS 895 Doctoral Research</td></tr>\
<tr><td></td><td></td><td>2644</td><td>001</td><td>08/25-12/12</td><td>TBA</td><td>TBA</td>\
<td>TBA</td><td>Smith</td><td>LEC</td><td>Open</td><td>5/30</td></tr>\
<tr><td></td><td>Topic: Distributed Systems</td></tr>\
<tr><td></td><td></td><td></td></tr>\
</table>]]></ClassList></Response>";

pub const NO_CLASSES_XML: &str = "<Response><ErrorCode>CSTCLS_NOCL2</ErrorCode></Response>";

pub const DETAILS_XML: &str = "<Response><ClassDetails><![CDATA[<div><table><tr><td>\
<table><tr><td>Session:</td><td>Regular Academic Session</td>\
<td>Credits:</td><td>3.00</td>\
<td>Last Day to Drop:</td><td>09/08/2025</td></tr></table>\
<table><tr><td><b>Course Description:</b><br/>An introduction to research methods.</td></tr></table>\
</td></tr></table></div>]]></ClassDetails></Response>";

/// Minimal stand-in for the registration system. Counts every request it answers.
pub struct CampusNetStub {
    pub base_url: String,
    requests: Arc<AtomicUsize>,
    shutdown_tx: Option<mpsc::Sender<()>>,
    handle: Option<thread::JoinHandle<()>>,
}

impl CampusNetStub {
    pub fn spawn() -> Self {
        let server = tiny_http::Server::http("127.0.0.1:0").expect("start campusnet stub server");
        let addr = server.server_addr();
        let base_url = format!("http://{addr}");

        let requests = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&requests);
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
                counter.fetch_add(1, Ordering::SeqCst);

                let (status, body) = route(request.method(), request.url());
                let _ = request
                    .respond(tiny_http::Response::from_string(body).with_status_code(status));
            }
        });

        Self {
            base_url,
            requests,
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        }
    }

    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

fn route(method: &tiny_http::Method, raw_url: &str) -> (u16, &'static str) {
    let Ok(url) = url::Url::parse(&format!("http://stub{raw_url}")) else {
        return (400, "bad url");
    };
    let params: HashMap<String, String> = url.query_pairs().into_owned().collect();

    match (method, url.path()) {
        (tiny_http::Method::Post, "/ps8verify.jsp") => (200, "<html>Login in progress</html>"),
        (tiny_http::Method::Get, "/sec/classsearch/search_reg.jsp") => (200, TERMS_PAGE),
        (tiny_http::Method::Get, "/AJAX/AJAXMasterServlet") => {
            match params.get("function").map(String::as_str) {
                Some("getSubjectsRegular") => (200, SUBJECTS_XML),
                Some("getClasessResults") => {
                    match params.get("subject").map(String::as_str) {
                        Some("CIS") => (200, SEARCH_XML),
                        _ => (200, NO_CLASSES_XML),
                    }
                }
                Some("getClassDetails")
                    if params.get("classNbr").map(String::as_str) == Some("2644") =>
                {
                    (200, DETAILS_XML)
                }
                _ => (404, "unknown function"),
            }
        }
        _ => (404, "not found"),
    }
}

impl Drop for CampusNetStub {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
