use thread_page::{Error, PageConfig, PageController, PageEvent, Result, Task};

const THREAD_URL: &str = "https://example.org/b/res/1.html";

fn thread_html(reply_ids: &[u32]) -> String {
    let mut html = String::from(
        r#"<html><head><title>/b/ - Thread 1</title>
        <script>var autoRefreshDelay = 10;</script></head>
        <body><form id="delform"><div class="thread" id="thread1">
        <div class="op" id="post1"><a href="/b/res/1.html#1">No.</a> first</div>"#,
    );
    for id in reply_ids {
        html.push_str(&format!(
            r#"<table><tbody><tr><td class="doubledash">&#0168;</td>
            <td class="reply" id="reply{id}"><a href="/b/res/1.html#{id}">No.</a>
            <a href="/b/res/1.html#1" class="refop">&gt;&gt;1</a> reply {id}</td>
            </tr></tbody></table>"#
        ));
    }
    html.push_str("</div></form></body></html>");
    html
}

fn loaded_page(live: &[u32]) -> Result<PageController> {
    let mut page = PageController::from_html(&thread_html(live), THREAD_URL)?;
    page.dispatch(PageEvent::Load)?;
    Ok(page)
}

#[test]
fn fetched_page_appends_only_the_missing_reply() -> Result<()> {
    let mut page = loaded_page(&[1, 2])?;
    page.fetcher_mut()
        .set_response(THREAD_URL, &thread_html(&[1, 2, 3]));

    page.advance_time(10_000)?;

    assert_eq!(page.reply_ids(), vec!["reply1", "reply2", "reply3"]);
    assert_eq!(page.fetcher_mut().take_calls(), vec![THREAD_URL.to_string()]);

    let reply = page.element_by_id("reply3")?;
    let row = page
        .dom()
        .parent(reply)
        .ok_or_else(|| Error::ElementNotFound("reply3 row".into()))?;
    let marker = page.dom().children(row)[0];
    assert!(page.dom().class_contains(marker, "doubledash"));
    assert_eq!(page.dom().text_content(marker), "\u{A8}");

    let thread = page.element_by_id("thread1")?;
    let table = page
        .dom()
        .ancestor(reply, 3)
        .ok_or_else(|| Error::ElementNotFound("reply3 table".into()))?;
    assert_eq!(page.dom().tag_name(table), Some("table"));
    assert_eq!(page.dom().children(thread).last(), Some(&table));
    Ok(())
}

#[test]
fn new_replies_are_bound_like_the_initial_page() -> Result<()> {
    let mut page = loaded_page(&[1])?;
    page.fetcher_mut()
        .set_response(THREAD_URL, &thread_html(&[1, 2]));
    page.advance_time(10_000)?;

    let reply = page.element_by_id("reply2")?;
    assert_eq!(page.dom().attr(reply, "postid").as_deref(), Some("2"));
    Ok(())
}

#[test]
fn repeated_polls_never_duplicate_replies() -> Result<()> {
    let mut page = loaded_page(&[1])?;
    page.fetcher_mut()
        .set_response(THREAD_URL, &thread_html(&[1, 2, 3]));

    for _ in 0..5 {
        page.advance_time(10_000)?;
    }

    assert_eq!(page.reply_ids(), vec!["reply1", "reply2", "reply3"]);
    assert_eq!(page.fetcher_mut().take_calls().len(), 5);
    Ok(())
}

#[test]
fn fragment_is_not_sent_with_the_poll() -> Result<()> {
    let mut page =
        PageController::from_html(&thread_html(&[1]), "https://example.org/b/res/1.html#5")?;
    page.dispatch(PageEvent::Load)?;
    page.fetcher_mut().set_response(THREAD_URL, &thread_html(&[1]));
    page.advance_time(10_000)?;
    assert_eq!(page.fetcher_mut().take_calls(), vec![THREAD_URL.to_string()]);
    Ok(())
}

#[test]
fn failed_fetch_is_logged_and_polling_continues() -> Result<()> {
    let mut page = loaded_page(&[1])?;
    page.fetcher_mut().enqueue_failure(THREAD_URL, "connection reset");
    page.fetcher_mut()
        .set_response(THREAD_URL, &thread_html(&[1, 2]));

    page.advance_time(10_000)?;
    let console = page.take_console_logs();
    assert_eq!(console.len(), 1);
    assert!(console[0].starts_with("Failed to refresh thread:"));
    assert!(console[0].contains("connection reset"));
    assert_eq!(page.reply_ids(), vec!["reply1"]);

    let timers = page.pending_timers();
    assert_eq!(timers.len(), 1);
    assert_eq!(timers[0].task, Task::RefreshReplies);
    assert_eq!(timers[0].due_at, 20_000);

    page.advance_time(10_000)?;
    assert_eq!(page.reply_ids(), vec!["reply1", "reply2"]);
    assert!(page.take_console_logs().is_empty());
    Ok(())
}

#[test]
fn unfocused_tab_counts_new_replies_and_blinks() -> Result<()> {
    let mut page = loaded_page(&[1])?;
    page.dispatch(PageEvent::Blur)?;
    page.fetcher_mut()
        .set_response(THREAD_URL, &thread_html(&[1, 2, 3]));

    page.advance_time(10_000)?;
    assert_eq!(page.new_replies_count(), 2);
    assert!(page.is_blinking());
    assert_eq!(page.title(), "(2 new)");
    Ok(())
}

#[test]
fn index_pages_do_not_poll() -> Result<()> {
    let mut page = PageController::from_html(&thread_html(&[1]), "https://example.org/b/")?;
    page.dispatch(PageEvent::Load)?;
    assert!(page.pending_timers().is_empty());
    Ok(())
}

#[test]
fn custom_fetcher_closure_drives_the_poll() -> Result<()> {
    let fetcher = |url: &str| -> Result<String> {
        assert_eq!(url, THREAD_URL);
        Ok(thread_html(&[1, 2]))
    };
    let config = PageConfig::default().with_auto_refresh_delay_secs(5);
    let mut page = PageController::with_config(&thread_html(&[1]), THREAD_URL, config, fetcher)?;
    page.dispatch(PageEvent::Load)?;
    page.advance_time(5_000)?;
    assert_eq!(page.reply_ids(), vec!["reply1", "reply2"]);
    Ok(())
}

#[test]
fn zero_refresh_delay_still_advances() -> Result<()> {
    let html = thread_html(&[1]).replace("autoRefreshDelay = 10", "autoRefreshDelay = 0");
    let mut page = PageController::from_html(&html, THREAD_URL)?;
    page.dispatch(PageEvent::Load)?;
    page.fetcher_mut().set_response(THREAD_URL, &thread_html(&[1, 2]));

    page.advance_time(1)?;
    assert!(page.fetcher_mut().take_calls().is_empty());
    page.advance_time(2_999)?;
    assert_eq!(page.fetcher_mut().take_calls().len(), 3);
    assert_eq!(page.reply_ids(), vec!["reply1", "reply2"]);
    Ok(())
}
