use autoesc::{HtmlEscapingWriter, Value};

fn main() {
    divan::main();
}

#[divan::bench]
fn bench_mixed_template(bencher: divan::Bencher) {
    let rows: Vec<(String, String)> = (0..200)
        .map(|i| {
            (
                format!("/item?id={i}&ref=bench \"quoted\""),
                format!("Item <{i}> & 'more'"),
            )
        })
        .collect();

    bencher.bench(|| {
        let mut out = String::with_capacity(64 * 1024);
        let mut w = HtmlEscapingWriter::new(&mut out);
        w.write_safe("<!doctype html><html><body><ul>").unwrap();
        for (href, label) in &rows {
            w.write_safe("<li><a href=\"").unwrap();
            w.write(&Value::from(href.as_str())).unwrap();
            w.write_safe("\" onclick=\"pick(").unwrap();
            w.write(&Value::from(label.as_str())).unwrap();
            w.write_safe(")\">").unwrap();
            w.write(&Value::from(label.as_str())).unwrap();
            w.write_safe("</a></li>").unwrap();
        }
        w.write_safe("</ul></body></html>").unwrap();
        drop(w);
        out
    });
}

#[divan::bench]
fn bench_large_safe_passthrough(bencher: divan::Bencher) {
    let chunk = "<div class=\"row\"><p>plain text with no specials</p></div>".repeat(500);

    bencher.bench(|| {
        let mut out = String::with_capacity(chunk.len() + 16);
        let mut w = HtmlEscapingWriter::new(&mut out);
        w.write_safe(&chunk).unwrap();
        drop(w);
        out
    });
}
