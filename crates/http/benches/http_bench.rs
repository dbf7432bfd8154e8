use std::hint::black_box;

use bytes::BytesMut;
use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion, Throughput};
use http::{HeaderName, HeaderValue, StatusCode};
use nimble_http::codec::{RequestDecoder, ResponseEncoder};
use nimble_http::protocol::Response;
use serde_json::json;
use tokio_util::codec::{Decoder, Encoder};

const SMALL_REQUEST: &str = "GET / HTTP/1.1\r\nHost: localhost\r\n\r\n";

const LARGE_REQUEST: &str = "POST /api/users/42?expand=groups HTTP/1.1\r\n\
Host: 127.0.0.1:8080\r\n\
User-Agent: Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko)\r\n\
Accept: text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8\r\n\
Accept-Language: en-US,en;q=0.9\r\n\
Accept-Encoding: gzip, deflate, br\r\n\
Cache-Control: no-cache\r\n\
Cookie: session=7c4a8d09ca3762af61e59520943dc26494f8941b; theme=dark\r\n\
Content-Type: application/json\r\n\
Content-Length: 27\r\n\
\r\n\
{\"name\":\"nimble\",\"age\":42}";

fn benchmark_request_decoder(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("request_decoder");

    for (name, request) in [("small_request", SMALL_REQUEST), ("large_request", LARGE_REQUEST)] {
        group.throughput(Throughput::Bytes(request.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(name), request, |b, request| {
            let mut request_decoder = RequestDecoder::new();
            b.iter_batched_ref(
                || BytesMut::from(request),
                |bytes_mut| {
                    let request = request_decoder.decode(bytes_mut).expect("input should be a valid http request");
                    black_box(request);
                },
                BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

fn benchmark_response_encoder(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("response_encoder");

    let text = Response::text("Hello World!");
    let json = Response::json(json!({"id": 42, "name": "nimble", "groups": ["admin", "dev"]}))
        .with_status(StatusCode::CREATED)
        .with_header(HeaderName::from_static("x-request-id"), HeaderValue::from_static("8c1f0a"));

    for (name, response) in [("text_response", text), ("json_response", json)] {
        group.bench_with_input(BenchmarkId::from_parameter(name), &response, |b, response| {
            let mut encoder = ResponseEncoder::new();
            b.iter_batched_ref(
                || BytesMut::with_capacity(1024),
                |dst| {
                    encoder.encode(response.clone(), dst).expect("encoding into memory should not fail");
                    black_box(dst);
                },
                BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_request_decoder, benchmark_response_encoder);
criterion_main!(benches);
