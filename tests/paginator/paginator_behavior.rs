//! Enumeration tests for cloudops-paginator.
//!
//! Tests enumeration including:
//! - 50/50/10 page-number scenario
//! - Next-token echo and termination
//! - Operation-driven enumeration through a retrying client
//! - Guards against runaway enumeration

use cloudops_core::{ApiError, Operation, OperationError, Payload, TransientCode};
use cloudops_paginator::{Page, PageCursor, PageParams, PagePaths, PageRequest, PaginatorConfig};
use cloudops_retry::RetryConfig;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

fn payload(value: Value) -> Payload {
    match value {
        Value::Object(map) => map,
        _ => Payload::new(),
    }
}

/// A list endpoint over `total` vSwitches answering `PageNumber`/`PageSize`.
fn vswitch_client(
    total: usize,
    requests: Arc<Mutex<Vec<(u64, u64)>>>,
) -> impl tower::Service<Operation, Response = Payload, Error = ApiError> + Clone {
    tower::service_fn(move |op: Operation| {
        let requests = Arc::clone(&requests);
        async move {
            let page = op.params()["PageNumber"].as_u64().unwrap_or(0);
            let size = op.params()["PageSize"].as_u64().unwrap_or(0);
            requests.lock().unwrap().push((page, size));

            let start = ((page - 1) * size) as usize;
            let end = (start + size as usize).min(total);
            let items: Vec<Value> = (start..end)
                .map(|i| json!({"VSwitchId": format!("vsw-{i}"), "VSwitchName": format!("app-{i}")}))
                .collect();

            Ok(payload(json!({
                "VSwitches": {"VSwitch": items},
                "TotalCount": total,
                "PageNumber": page,
                "PageSize": size
            })))
        }
    })
}

#[tokio::test]
async fn fifty_fifty_ten_takes_three_calls() {
    let requests = Arc::new(Mutex::new(Vec::new()));
    let client = vswitch_client(110, Arc::clone(&requests));

    let paginator = PaginatorConfig::<Value>::builder()
        .name("vswitches")
        .items_path("$.VSwitches.VSwitch")
        .build();
    let retry = RetryConfig::builder().build();
    let op = Operation::new("DescribeVSwitches", "2016-04-28").param("VpcId", "vpc-1");

    let items = paginator.collect_operation(&retry, client, &op).await.unwrap();

    assert_eq!(items.len(), 110);
    assert_eq!(*requests.lock().unwrap(), vec![(1, 50), (2, 50), (3, 50)]);
    assert_eq!(items[0]["VSwitchId"], json!("vsw-0"));
    assert_eq!(items[109]["VSwitchId"], json!("vsw-109"));
}

#[tokio::test]
async fn empty_listing_takes_one_call() {
    let requests = Arc::new(Mutex::new(Vec::new()));
    let client = vswitch_client(0, Arc::clone(&requests));

    let paginator = PaginatorConfig::<Value>::builder()
        .items_path("$.VSwitches.VSwitch")
        .build();
    let items = paginator
        .collect_operation(
            &RetryConfig::builder().build(),
            client,
            &Operation::new("DescribeVSwitches", "2016-04-28"),
        )
        .await
        .unwrap();

    assert!(items.is_empty());
    assert_eq!(requests.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn next_token_is_echoed_until_empty() {
    let tokens = Arc::new(Mutex::new(Vec::new()));
    let t = Arc::clone(&tokens);

    let client = tower::service_fn(move |op: Operation| {
        let t = Arc::clone(&t);
        async move {
            let token = op.params().get("NextToken").and_then(Value::as_str).map(str::to_string);
            t.lock().unwrap().push((token.clone(), op.params().get("MaxResults").cloned()));
            let body = match token.as_deref() {
                None => json!({"TagResources": {"TagResource": [{"ResourceId": "a"}]}, "NextToken": "p2"}),
                Some("p2") => json!({"TagResources": {"TagResource": [{"ResourceId": "b"}]}, "NextToken": "p3"}),
                _ => json!({"TagResources": {"TagResource": [{"ResourceId": "c"}]}}),
            };
            Ok::<_, ApiError>(payload(body))
        }
    });

    let paginator = PaginatorConfig::<Value>::builder()
        .next_token_with_max_results(20)
        .items_path("$.TagResources.TagResource")
        .build();

    let items = paginator
        .collect_operation(
            &RetryConfig::builder().build(),
            client,
            &Operation::new("ListTagResources", "2016-04-28"),
        )
        .await
        .unwrap();

    let ids: Vec<_> = items.iter().map(|i| i["ResourceId"].clone()).collect();
    assert_eq!(ids, vec![json!("a"), json!("b"), json!("c")]);
    assert_eq!(
        *tokens.lock().unwrap(),
        vec![
            (None, Some(json!(20))),
            (Some("p2".to_string()), Some(json!(20))),
            (Some("p3".to_string()), Some(json!(20))),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn page_fetches_are_retried() {
    let calls = Arc::new(AtomicUsize::new(0));
    let c = Arc::clone(&calls);

    let client = tower::service_fn(move |op: Operation| {
        let n = c.fetch_add(1, Ordering::SeqCst);
        async move {
            if n == 1 {
                return Err(ApiError::service("SystemBusy", "busy"));
            }
            let page = op.params()["PageNumber"].as_u64().unwrap_or(0);
            let items = if page == 1 { vec![json!(1), json!(2)] } else { vec![json!(3)] };
            Ok(payload(json!({"Items": items})))
        }
    });

    let paginator = PaginatorConfig::<Value>::builder()
        .page_number(2)
        .items_path("$.Items")
        .build();
    let retry = RetryConfig::builder().retry_on(TransientCode::SystemBusy).build();

    let items = paginator
        .collect_operation(&retry, client, &Operation::new("ListThings", "2020-01-01"))
        .await
        .unwrap();

    assert_eq!(items, vec![json!(1), json!(2), json!(3)]);
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn fatal_page_error_stops_enumeration() {
    let client = tower::service_fn(|_op: Operation| async {
        Err::<Payload, _>(ApiError::service("Forbidden", "denied"))
    });
    let paginator = PaginatorConfig::<Value>::builder().items_path("$.Items").build();

    let err = paginator
        .collect_operation(
            &RetryConfig::builder().build(),
            client,
            &Operation::new("ListThings", "2020-01-01"),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, OperationError::Api { .. }));
}

#[tokio::test]
async fn non_array_items_are_a_missing_attribute() {
    let client = tower::service_fn(|_op: Operation| async {
        Ok::<_, ApiError>(payload(json!({"Items": "oops"})))
    });
    let paginator = PaginatorConfig::<Value>::builder().items_path("$.Items").build();

    let err = paginator
        .collect_operation(
            &RetryConfig::builder().build(),
            client,
            &Operation::new("ListThings", "2020-01-01"),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, OperationError::MissingAttribute { ref path, .. } if path == "$.Items"));
}

#[tokio::test]
async fn custom_parameter_names() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let s = Arc::clone(&seen);

    let client = tower::service_fn(move |op: Operation| {
        let s = Arc::clone(&s);
        async move {
            let marker = op.params().get("Marker").and_then(Value::as_str).map(str::to_string);
            s.lock().unwrap().push(marker.clone());
            let body = match marker {
                None => json!({"Policies": [{"Name": "p1"}], "NextMarker": "m2"}),
                Some(_) => json!({"Policies": [{"Name": "p2"}]}),
            };
            Ok::<_, ApiError>(payload(body))
        }
    });

    let paginator = PaginatorConfig::<Value>::builder()
        .next_token()
        .params(PageParams {
            next_token: "Marker".into(),
            ..PageParams::default()
        })
        .paths(PagePaths {
            items: "$.Policies".into(),
            next_token: Some("$.NextMarker".into()),
            total_count: None,
        })
        .build();

    let items = paginator
        .collect_operation(
            &RetryConfig::builder().build(),
            client,
            &Operation::new("ListPolicies", "2015-05-01"),
        )
        .await
        .unwrap();

    assert_eq!(items.len(), 2);
    assert_eq!(*seen.lock().unwrap(), vec![None, Some("m2".to_string())]);
}

#[tokio::test]
async fn repeated_token_terminates_with_error() {
    let calls = Arc::new(AtomicUsize::new(0));
    let c = Arc::clone(&calls);
    let paginator = PaginatorConfig::builder().next_token().build();

    let err = paginator
        .collect(move |_request| {
            c.fetch_add(1, Ordering::SeqCst);
            async { Ok(Page::new(vec!["x"]).with_next_token("stuck")) }
        })
        .await
        .unwrap_err();

    assert!(matches!(err, OperationError::Pagination { .. }));
    // first page hands out the token, second repeats it
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn max_pages_bounds_enumeration() {
    let paginator = PaginatorConfig::builder().page_number(10).max_pages(5).build();

    let err = paginator
        .collect(|_| async { Ok(Page::new(vec![0u32; 10])) })
        .await
        .unwrap_err();
    assert!(matches!(err, OperationError::Pagination { .. }));

    let ok = paginator
        .collect(|request| async move {
            Ok(match request.cursor {
                PageCursor::Number(n) if n < 5 => Page::new(vec![0u32; 10]),
                _ => Page::new(vec![1u32]),
            })
        })
        .await
        .unwrap();
    assert_eq!(ok.len(), 41);
}

#[tokio::test]
async fn completion_callback_reports_totals() {
    let totals = Arc::new(Mutex::new(None));
    let t = Arc::clone(&totals);

    let paginator = PaginatorConfig::builder()
        .page_number(3)
        .keep_if(|n: &u32| *n != 4)
        .on_complete(move |pages, items| *t.lock().unwrap() = Some((pages, items)))
        .build();

    let items = paginator
        .collect(|request| async move {
            Ok(match request.cursor {
                PageCursor::Number(1) => Page::new(vec![1, 2, 3]),
                PageCursor::Number(2) => Page::new(vec![4, 5, 6]),
                _ => Page::new(vec![7]),
            })
        })
        .await
        .unwrap();

    assert_eq!(items, vec![1, 2, 3, 5, 6, 7]);
    assert_eq!(*totals.lock().unwrap(), Some((3, 6)));
}

#[test]
fn request_advances_from_first_page() {
    let first = PageRequest::page_number(50);
    assert_eq!(first.cursor, PageCursor::Number(1));
    let second = first.advance(&Page::new(vec![(); 50])).unwrap();
    assert_eq!(second.cursor, PageCursor::Number(2));
    assert!(second.advance(&Page::new(vec![(); 10])).is_none());
}
