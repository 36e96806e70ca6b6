//! Transport-level tests: a real listener on an ephemeral port, one
//! dispatcher-style exchange per connection.

use crate::protocol::{JobRequest, JobResponse, FmtdError};
use crate::transport::{JobServer, JobTransport};

#[tokio::test]
async fn test_one_shot_exchange() {
    let server = JobServer::bind("127.0.0.1:0").await.unwrap();
    let addr = server.local_addr().unwrap().to_string();

    tokio::spawn(async move {
        server
            .run_with_handler(|req| async move {
                Ok(JobResponse::success(req.id, req.input.to_uppercase()))
            })
            .await
    });

    let transport = JobTransport::new();
    let mut stream = transport.connect(&addr).await.unwrap();
    let request = JobRequest::transform("abc");
    let response = transport.send_request(&mut stream, &request).await.unwrap();

    assert!(response.ok);
    assert_eq!(response.id, request.id);
    assert_eq!(response.output.as_deref(), Some("ABC"));
}

#[tokio::test]
async fn test_handler_error_becomes_failure_response() {
    let server = JobServer::bind("127.0.0.1:0").await.unwrap();
    let addr = server.local_addr().unwrap().to_string();

    tokio::spawn(async move {
        server
            .run_with_handler(|_req| async move {
                Err(FmtdError::InvalidRequest("unknown operation".to_string()))
            })
            .await
    });

    let transport = JobTransport::new();
    let mut stream = transport.connect(&addr).await.unwrap();
    let response = transport
        .send_request(&mut stream, &JobRequest::new("bogus", ""))
        .await
        .unwrap();

    assert!(!response.ok);
    assert!(response.error.unwrap().contains("unknown operation"));
}

#[tokio::test]
async fn test_connect_refused_is_connection_error() {
    // Bind then drop so the port is very likely unoccupied.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    drop(listener);

    let transport = JobTransport::new();
    let err = transport.connect(&addr).await.unwrap_err();
    assert!(matches!(err, FmtdError::Connection(_)), "got: {:?}", err);
}
