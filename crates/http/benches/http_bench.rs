use bytes::BytesMut;
use criterion::{Criterion, criterion_group, criterion_main};
use frederick_http::codec::{RecvBuffer, ResponseEncoder, parse_request_target};
use frederick_http::protocol::{Limits, Request, Response};
use std::hint::black_box;
use tokio::runtime::Runtime;
use tokio_util::codec::Encoder;

const SIMPLE_REQUEST: &[u8] = b"GET / HTTP/1.1\r\nHost: localhost\r\n\r\n";

const FULL_REQUEST: &[u8] = b"POST /api/v1/users/42?sort=Name&limit=10#top HTTP/1.1\r\n\
Host: example.com:8080\r\n\
User-Agent: bench/1.0\r\n\
Accept: application/json\r\n\
Cookie: session=abc123; theme=dark\r\n\
Transfer-Encoding: chunked\r\n\
\r\n\
5\r\nhello\r\n6\r\n world\r\n0\r\n\r\n";

fn bench_request_build(c: &mut Criterion) {
    let runtime = match Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => panic!("failed to build runtime: {e}"),
    };

    c.bench_function("build_simple_request", |b| {
        b.to_async(&runtime).iter(|| async {
            let mut recv = RecvBuffer::new(SIMPLE_REQUEST);
            black_box(Request::build(&mut recv, &Limits::default()).await.unwrap());
        });
    });

    c.bench_function("build_chunked_request", |b| {
        b.to_async(&runtime).iter(|| async {
            let mut recv = RecvBuffer::new(FULL_REQUEST);
            black_box(Request::build(&mut recv, &Limits::default()).await.unwrap());
        });
    });
}

fn bench_request_target(c: &mut Criterion) {
    c.bench_function("parse_request_target", |b| {
        b.iter(|| black_box(parse_request_target(black_box("http://user:pw@[::1]:8080/a/b%20c/d?x=1&y=Two#f1,f2")).unwrap()));
    });
}

fn bench_response_encoder(c: &mut Criterion) {
    c.bench_function("encode_small_response", |b| {
        b.iter(|| {
            let mut response = Response::new();
            response.set_content("Hello World!");
            response.handle_content();

            let mut bytes = BytesMut::new();
            ResponseEncoder::new().encode(response, &mut bytes).unwrap();
            black_box(bytes);
        });
    });

    let body = "x".repeat(4096);
    c.bench_function("encode_chunked_response", |b| {
        b.iter(|| {
            let mut response = Response::new();
            response.set_content(body.clone());
            response.handle_content();

            let mut bytes = BytesMut::new();
            ResponseEncoder::new().encode(response, &mut bytes).unwrap();
            black_box(bytes);
        });
    });
}

criterion_group!(benches, bench_request_build, bench_request_target, bench_response_encoder);
criterion_main!(benches);
