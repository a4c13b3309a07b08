//! Shared templates rendered from many threads.

use partials::test_utils::TestSite;
use serde_json::json;
use std::sync::Arc;
use std::thread;

#[test]
fn test_shared_template_renders_independently() {
    let site = TestSite::new().include("greet.html", "Hello {{ include.who }} from {{ origin }}");
    let engine = Arc::new(site.engine());
    let template = Arc::new(engine.parse("{% include greet.html who=name %}").unwrap());

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let engine = Arc::clone(&engine);
            let template = Arc::clone(&template);
            let mut ctx = site.context_with(json!({"name": format!("user{i}"), "origin": format!("thread{i}")}));
            thread::spawn(move || {
                let mut outputs = Vec::new();
                for _ in 0..20 {
                    outputs.push(template.render(&mut ctx, &engine).unwrap());
                }
                assert_eq!(ctx.nesting(), 0);
                (i, outputs)
            })
        })
        .collect();

    for handle in handles {
        let (i, outputs) = handle.join().unwrap();
        for output in outputs {
            assert_eq!(output, format!("Hello user{i} from thread{i}"));
        }
    }
}

#[tokio::test]
async fn test_blocking_pool_renders() {
    let site = TestSite::new().include("n.html", "[{{ include.n }}]");
    let engine = Arc::new(site.engine());

    let tasks: Vec<_> = (0..4)
        .map(|n| {
            let engine = Arc::clone(&engine);
            let mut ctx = site.context_with(json!({"n": n}));
            tokio::task::spawn_blocking(move || engine.render_str("{% include n.html n=n %}", &mut ctx))
        })
        .collect();

    for (n, task) in futures::future::join_all(tasks).await.into_iter().enumerate() {
        assert_eq!(task.unwrap().unwrap(), format!("[{n}]"));
    }
}
