//! End-to-end behaviour of two messengers over an in-memory link.

use serde_json::{Value, json};
use weft_bridge::{BridgeError, LocalInterface, Messenger, RemoteError, memory_pair};

fn counter_interface() -> LocalInterface {
    let count = std::sync::Arc::new(std::sync::atomic::AtomicUsize::new(0));
    LocalInterface::new().method("bump", move |by: usize| {
        let now = count.fetch_add(by, std::sync::atomic::Ordering::SeqCst) + by;
        Ok::<_, RemoteError>(now)
    })
}

#[tokio::test]
async fn unknown_method_rejects_and_channel_keeps_working() {
    let (a, b) = memory_pair();
    let host = Messenger::new("editor", a.port);
    let view = Messenger::new("editor", b.port);
    view.set_local_interface(counter_interface());
    host.spawn_serve(a.inbound);
    view.spawn_serve(b.inbound);

    let err = host.call::<_, Value>("frobnicate", &json!([])).await.unwrap_err();
    assert!(matches!(err, BridgeError::UnknownRemoteMethod(ref m) if m == "frobnicate"));

    let first: usize = host.call("bump", &2).await.unwrap();
    let second: usize = host.call("bump", &3).await.unwrap();
    assert_eq!((first, second), (2, 5));
}

#[tokio::test]
async fn calls_are_symmetric() {
    let (a, b) = memory_pair();
    let host = Messenger::new("editor", a.port);
    let view = Messenger::new("editor", b.port);
    host.set_local_interface(
        LocalInterface::new().method("hostName", |_: Value| Ok::<_, RemoteError>("host")),
    );
    view.set_local_interface(counter_interface());
    host.spawn_serve(a.inbound);
    view.spawn_serve(b.inbound);

    let name: String = view.call("hostName", &()).await.unwrap();
    assert_eq!(name, "host");
    let n: usize = host.call("bump", &1).await.unwrap();
    assert_eq!(n, 1);
}

#[tokio::test]
async fn notifications_arrive_in_order() {
    let (a, b) = memory_pair();
    let host = Messenger::new("editor", a.port);
    let view = Messenger::new("editor", b.port);
    let seen = std::sync::Arc::new(std::sync::Mutex::new(Vec::new()));
    let sink = seen.clone();
    view.set_local_interface(
        LocalInterface::new()
            .method("log", move |line: String| {
                sink.lock().unwrap().push(line);
                Ok::<_, RemoteError>(())
            })
            .method("flush", |_: Value| Ok::<_, RemoteError>(())),
    );
    host.spawn_serve(a.inbound);
    view.spawn_serve(b.inbound);

    for i in 0..5 {
        host.notify("log", &format!("line {i}")).unwrap();
    }
    // A correlated call after the notifications is answered after they ran.
    host.call::<_, ()>("flush", &()).await.unwrap();
    assert_eq!(
        *seen.lock().unwrap(),
        (0..5).map(|i| format!("line {i}")).collect::<Vec<_>>()
    );
}

#[tokio::test]
async fn transport_close_rejects_pending_calls() {
    let (a, b) = memory_pair();
    let host = Messenger::new("editor", a.port);
    let serve = host.spawn_serve(a.inbound);

    let pending = {
        let host = host.clone();
        tokio::spawn(async move { host.call::<_, Value>("never", &()).await })
    };
    while host.pending_calls() == 0 {
        tokio::task::yield_now().await;
    }

    // The webview goes away without answering.
    drop(b);
    serve.await.unwrap();

    assert!(matches!(pending.await.unwrap(), Err(BridgeError::TransportClosed)));
    assert!(host.is_closed());
    assert!(matches!(
        host.call::<_, Value>("again", &()).await,
        Err(BridgeError::TransportClosed)
    ));
}

#[tokio::test]
async fn panicking_handler_rejects_and_channel_keeps_working() {
    let (a, b) = memory_pair();
    let host = Messenger::new("editor", a.port);
    let view = Messenger::new("editor", b.port);
    let count = std::sync::Arc::new(std::sync::atomic::AtomicUsize::new(0));
    view.set_local_interface(
        LocalInterface::new()
            .method("boom", |_: Value| -> Result<(), RemoteError> { panic!("handler bug") })
            .method_async("boomLater", |fail: bool| async move {
                tokio::task::yield_now().await;
                if fail {
                    panic!("async handler bug");
                }
                Ok::<_, RemoteError>(())
            })
            .method("bump", move |by: usize| {
                Ok::<_, RemoteError>(count.fetch_add(by, std::sync::atomic::Ordering::SeqCst) + by)
            }),
    );
    host.spawn_serve(a.inbound);
    view.spawn_serve(b.inbound);

    let err = host.call::<_, Value>("boom", &()).await.unwrap_err();
    assert_eq!(err.remote_kind(), Some("HandlerPanicked"));
    assert!(matches!(&err, BridgeError::Remote(e) if e.message.contains("handler bug")));

    let err = host.call::<_, Value>("boomLater", &true).await.unwrap_err();
    assert_eq!(err.remote_kind(), Some("HandlerPanicked"));
    host.call::<_, ()>("boomLater", &false).await.unwrap();

    // A panicking notification leaves the loop running as well.
    host.notify("boom", &()).unwrap();
    let n: usize = host.call("bump", &4).await.unwrap();
    assert_eq!(n, 4);
    assert!(!view.is_closed());
    assert_eq!(host.pending_calls(), 0);
}

#[tokio::test]
async fn closing_stops_the_serve_loop() {
    let (a, b) = memory_pair();
    let host = Messenger::new("editor", a.port);
    let view = Messenger::new("editor", b.port);
    view.set_local_interface(counter_interface());
    let host_serve = host.spawn_serve(a.inbound);
    let view_serve = view.spawn_serve(b.inbound);

    let n: usize = host.call("bump", &1).await.unwrap();
    assert_eq!(n, 1);

    // The view's serve loop is parked on an idle stream; closing wakes it.
    view.close();
    drop(view);
    view_serve.await.unwrap();

    // Its port is gone with the last messenger clone, so the host closes too.
    host_serve.await.unwrap();
    assert!(matches!(
        host.call::<_, usize>("bump", &1).await,
        Err(BridgeError::TransportClosed)
    ));
}
