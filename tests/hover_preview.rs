use thread_page::{PageController, PageEvent, Result};

const THREAD_URL: &str = "https://example.org/b/res/1.html";

const PAGE: &str = r##"<html><head><title>/b/ - Thread 1</title></head><body>
<div class="op" id="post1">
  <span class="postnum"><a href="/b/res/1.html#1">No.</a><a href="/b/res/1.html#q1">1</a></span>
  <blockquote id="op-body">hello <b>thread</b></blockquote>
</div>
<table><tbody><tr><td class="doubledash">&#0168;</td><td class="reply" id="reply2">
  <span class="postnum"><a href="/b/res/1.html#2">No.</a><a href="/b/res/1.html#q2">2</a></span>
  <blockquote><a id="to-op" href="/b/res/1.html#1" class="refop">&gt;&gt;1</a> hi</blockquote>
</td></tr></tbody></table>
<table><tbody><tr><td class="doubledash">&#0168;</td><td class="reply" id="reply3">
  <span class="postnum"><a href="#3">No.</a></span>
  <blockquote><a id="to-reply" href="#2" class="refreply">&gt;&gt;2</a>
  <a id="to-missing" href="#77" class="refreply">&gt;&gt;77</a></blockquote>
</td></tr></tbody></table>
</body></html>"##;

fn loaded() -> Result<PageController> {
    let mut page = PageController::from_html(PAGE, THREAD_URL)?;
    page.dispatch(PageEvent::Load)?;
    Ok(page)
}

fn preview_count(page: &PageController) -> usize {
    page.dom().elements_by_class("post-preview").len()
}

#[test]
fn enter_creates_and_leave_removes_the_preview() -> Result<()> {
    let mut page = loaded()?;
    let link = page.element_by_id("to-op")?;

    page.dispatch(PageEvent::PointerMove { x: 300, y: 45 })?;
    page.dispatch(PageEvent::PointerEnter(link))?;
    assert_eq!(preview_count(&page), 1);

    let preview = page.dom().elements_by_class("post-preview")[0];
    assert_eq!(page.dom().attr(preview, "data-preview-for").as_deref(), Some("1"));
    assert_eq!(
        page.dom().attr(preview, "style").as_deref(),
        Some("position: absolute; left: 300px; top: 45px; z-index: 100;")
    );
    assert!(page.dom().text_content(preview).contains("hello thread"));
    // The copy must not steal the original's id.
    assert_eq!(
        page.dom().parent(page.element_by_id("op-body")?),
        Some(page.element_by_id("post1")?)
    );

    page.dispatch(PageEvent::PointerLeave(link))?;
    assert_eq!(preview_count(&page), 0);
    Ok(())
}

#[test]
fn rapid_enter_leave_never_stacks_previews() -> Result<()> {
    let mut page = loaded()?;
    let link = page.element_by_id("to-reply")?;

    for _ in 0..10 {
        page.dispatch(PageEvent::PointerEnter(link))?;
        page.dispatch(PageEvent::PointerEnter(link))?;
        assert_eq!(preview_count(&page), 1);
        page.dispatch(PageEvent::PointerLeave(link))?;
        page.dispatch(PageEvent::PointerLeave(link))?;
        assert_eq!(preview_count(&page), 0);
    }
    Ok(())
}

#[test]
fn repeated_hovers_reuse_one_preview() -> Result<()> {
    let mut page = loaded()?;
    let link = page.element_by_id("to-op")?;

    page.dispatch(PageEvent::PointerEnter(link))?;
    let first = page.dom().elements_by_class("post-preview")[0];
    page.dispatch(PageEvent::PointerLeave(link))?;
    let nodes = page.dom().node_count();

    for step in 0..20 {
        page.dispatch(PageEvent::PointerMove { x: step, y: 2 * step })?;
        page.dispatch(PageEvent::PointerEnter(link))?;
        page.dispatch(PageEvent::PointerLeave(link))?;
    }
    assert_eq!(page.dom().node_count(), nodes);

    page.dispatch(PageEvent::PointerMove { x: 7, y: 9 })?;
    page.dispatch(PageEvent::PointerEnter(link))?;
    assert_eq!(page.dom().elements_by_class("post-preview"), vec![first]);
    assert_eq!(
        page.dom().attr(first, "style").as_deref(),
        Some("position: absolute; left: 7px; top: 9px; z-index: 100;")
    );
    Ok(())
}

#[test]
fn two_links_keep_separate_previews() -> Result<()> {
    let mut page = loaded()?;
    let to_op = page.element_by_id("to-op")?;
    let to_reply = page.element_by_id("to-reply")?;

    page.dispatch(PageEvent::PointerEnter(to_op))?;
    page.dispatch(PageEvent::PointerEnter(to_reply))?;
    assert_eq!(page.open_preview_count(), 2);

    page.dispatch(PageEvent::PointerLeave(to_op))?;
    assert_eq!(page.open_preview_count(), 1);
    let remaining = page.dom().elements_by_class("post-preview")[0];
    assert_eq!(page.dom().attr(remaining, "data-preview-for").as_deref(), Some("2"));
    Ok(())
}

#[test]
fn preview_of_unknown_post_is_skipped() -> Result<()> {
    let mut page = loaded()?;
    let link = page.element_by_id("to-missing")?;
    page.dispatch(PageEvent::PointerEnter(link))?;
    assert_eq!(preview_count(&page), 0);
    Ok(())
}

#[test]
fn hovering_unbound_elements_does_nothing() -> Result<()> {
    let mut page = loaded()?;
    let body = page.element_by_id("op-body")?;
    page.dispatch(PageEvent::PointerEnter(body))?;
    page.dispatch(PageEvent::PointerLeave(body))?;
    assert_eq!(preview_count(&page), 0);
    Ok(())
}

#[test]
fn load_tags_every_post_with_its_number() -> Result<()> {
    let page = loaded()?;
    for (id, expected) in [("post1", "1"), ("reply2", "2"), ("reply3", "3")] {
        let post = page.element_by_id(id)?;
        assert_eq!(page.dom().attr(post, "postid").as_deref(), Some(expected));
    }
    Ok(())
}
