mod common;

use common::{runtime, transport};
use ldsync::tus::TusUpload;
use ldsync::{Job, PollPolicy, TimeoutError, TransportError, UploadClient};
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn job_at(server: &MockServer) -> Job {
    Job {
        job_id: "j1".to_string(),
        status: "created".to_string(),
        job_url: format!("{}/jobs/j1", server.uri()),
        graph_names: vec![],
        error: None,
    }
}

fn fast_poll(max_attempts: u32) -> PollPolicy {
    PollPolicy::new(max_attempts, Duration::from_millis(1))
}

#[test]
fn create_job_declares_upload() {
    let rt = runtime();
    let server = rt.block_on(MockServer::start());
    rt.block_on(
        Mock::given(method("POST"))
            .and(path("/datasets/acme/energy/jobs"))
            .and(body_json(json!({"type": "upload"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jobId": "j1",
                "status": "created",
                "jobUrl": format!("{}/jobs/j1", server.uri())
            })))
            .expect(1)
            .mount(&server),
    );

    let client = UploadClient::new(transport(&server));
    let job = client.create_job("acme", "energy").unwrap();

    assert_eq!(job.job_id, "j1");
    assert_eq!(job.status, "created");
    assert!(job.graph_names.is_empty());
}

#[test]
fn upload_bytes_transfers_chunks() {
    let rt = runtime();
    let server = rt.block_on(MockServer::start());
    rt.block_on(
        Mock::given(method("POST"))
            .and(path("/jobs/j1/add"))
            .and(header("Tus-Resumable", "1.0.0"))
            .and(header("Upload-Length", "10"))
            .respond_with(
                ResponseTemplate::new(201)
                    .insert_header("Location", format!("{}/jobs/j1/add/u1", server.uri()).as_str()),
            )
            .expect(1)
            .mount(&server),
    );
    // 10 bytes in 4-byte chunks: three PATCH requests
    rt.block_on(
        Mock::given(method("PATCH"))
            .and(path("/jobs/j1/add/u1"))
            .and(header("Content-Type", "application/offset+octet-stream"))
            .respond_with(ResponseTemplate::new(204))
            .expect(3)
            .mount(&server),
    );

    let transport = transport(&server);
    let client = UploadClient::new(transport.clone())
        .with_tus(TusUpload::new(transport).with_chunk_size(4));
    client
        .upload_bytes(&job_at(&server), b"0123456789", "graphs.trig")
        .unwrap();
}

#[test]
fn upload_bytes_absorbs_spurious_created_answer() {
    let rt = runtime();
    let server = rt.block_on(MockServer::start());
    rt.block_on(
        Mock::given(method("POST"))
            .and(path("/jobs/j1/add"))
            .respond_with(
                ResponseTemplate::new(201)
                    .insert_header("Location", format!("{}/jobs/j1/add/u1", server.uri()).as_str()),
            )
            .expect(1)
            .mount(&server),
    );
    // the registry acknowledges the final chunk with 200 + JSON instead of 204
    rt.block_on(
        Mock::given(method("PATCH"))
            .and(path("/jobs/j1/add/u1"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                "{\"type\":\"upload\",\"status\":\"created\",\"jobId\":\"j1\"}",
            ))
            .expect(1)
            .mount(&server),
    );

    let client = UploadClient::new(transport(&server));
    client
        .upload_bytes(&job_at(&server), b"payload", "graphs.trig")
        .unwrap();
}

#[test]
fn upload_bytes_propagates_other_transfer_errors() {
    let rt = runtime();
    let server = rt.block_on(MockServer::start());
    rt.block_on(
        Mock::given(method("POST"))
            .and(path("/jobs/j1/add"))
            .respond_with(
                ResponseTemplate::new(201)
                    .insert_header("Location", format!("{}/jobs/j1/add/u1", server.uri()).as_str()),
            )
            .expect(1)
            .mount(&server),
    );
    rt.block_on(
        Mock::given(method("PATCH"))
            .and(path("/jobs/j1/add/u1"))
            .respond_with(ResponseTemplate::new(409).set_body_string("offset mismatch"))
            .expect(1)
            .mount(&server),
    );

    let client = UploadClient::new(transport(&server));
    let err = client
        .upload_bytes(&job_at(&server), b"payload", "graphs.trig")
        .unwrap_err();
    let transport_err = err.downcast_ref::<TransportError>().unwrap();

    assert_eq!(transport_err.status.as_u16(), 409);
    assert_eq!(transport_err.body, "offset mismatch");
}

#[test]
fn start_job_and_wait_returns_after_three_polls() {
    let rt = runtime();
    let server = rt.block_on(MockServer::start());
    rt.block_on(
        Mock::given(method("POST"))
            .and(path("/jobs/j1/start"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jobId": "j1",
                "status": "started",
                "jobUrl": format!("{}/jobs/j1", server.uri())
            })))
            .expect(1)
            .mount(&server),
    );
    rt.block_on(
        Mock::given(method("GET"))
            .and(path("/jobs/j1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jobId": "j1",
                "status": "starting",
                "jobUrl": format!("{}/jobs/j1", server.uri())
            })))
            .up_to_n_times(2)
            .expect(2)
            .mount(&server),
    );
    rt.block_on(
        Mock::given(method("GET"))
            .and(path("/jobs/j1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jobId": "j1",
                "status": "finished",
                "jobUrl": format!("{}/jobs/j1", server.uri()),
                "graphNames": ["http://g.example/imported-0", "http://g.example/imported-1"]
            })))
            .expect(1)
            .mount(&server),
    );

    let client = UploadClient::new(transport(&server));
    let job = client
        .start_job_and_wait(&job_at(&server), &fast_poll(6))
        .unwrap();

    assert_eq!(job.status, "finished");
    assert_eq!(
        job.graph_names,
        vec!["http://g.example/imported-0", "http://g.example/imported-1"]
    );
}

#[test]
fn start_job_and_wait_times_out_after_max_tries_polls() {
    let rt = runtime();
    let server = rt.block_on(MockServer::start());
    rt.block_on(
        Mock::given(method("POST"))
            .and(path("/jobs/j1/start"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jobId": "j1",
                "status": "started",
                "jobUrl": format!("{}/jobs/j1", server.uri())
            })))
            .expect(1)
            .mount(&server),
    );
    // exactly max_tries polls, then the budget is spent
    rt.block_on(
        Mock::given(method("GET"))
            .and(path("/jobs/j1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jobId": "j1",
                "status": "running",
                "jobUrl": format!("{}/jobs/j1", server.uri())
            })))
            .expect(3)
            .mount(&server),
    );

    let client = UploadClient::new(transport(&server));
    let err = client
        .start_job_and_wait(&job_at(&server), &fast_poll(3))
        .unwrap_err();
    let timeout = err.downcast_ref::<TimeoutError>().unwrap();

    assert_eq!(timeout.message, "Job did not finish in time");
}

#[test]
fn start_job_and_wait_fails_fast_on_error_status() {
    let rt = runtime();
    let server = rt.block_on(MockServer::start());
    rt.block_on(
        Mock::given(method("POST"))
            .and(path("/jobs/j1/start"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jobId": "j1",
                "status": "error",
                "jobUrl": format!("{}/jobs/j1", server.uri()),
                "error": "malformed payload"
            })))
            .expect(1)
            .mount(&server),
    );
    rt.block_on(
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server),
    );

    let client = UploadClient::new(transport(&server));
    let err = client
        .start_job_and_wait(&job_at(&server), &fast_poll(6))
        .unwrap_err();

    assert!(err.to_string().contains("malformed payload"));
}

#[test]
fn delete_job_issues_delete_on_job_url() {
    let rt = runtime();
    let server = rt.block_on(MockServer::start());
    rt.block_on(
        Mock::given(method("DELETE"))
            .and(path("/jobs/j1"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server),
    );

    let client = UploadClient::new(transport(&server));
    client.delete_job(&job_at(&server)).unwrap();
}
