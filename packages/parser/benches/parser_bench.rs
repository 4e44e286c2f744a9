use criterion::{black_box, criterion_group, criterion_main, Criterion};
use mailcraft_parser::{parse, parse_document};

fn flat_section(i: usize) -> String {
    format!(
        r#"
        <tr><td id="section-s{i}" style="background-color: #ffffff; padding: 16px">
          <table width="100%">
            <tr><td id="element-h{i}"><h2 style="font-size: 22px">Heading {i}</h2></td></tr>
            <tr><td id="element-t{i}"><p>Paragraph {i} with <b>bold</b> text &amp; an entity.</p></td></tr>
            <tr><td id="element-b{i}"><a href="https://example.com/{i}" style="background-color: #2563eb; color: #ffffff">Read more</a></td></tr>
            <tr><td id="element-i{i}"><a href="/p/{i}"><img src="https://cdn.example.com/{i}.png" alt="Image {i}"></a></td></tr>
            <tr><td id="element-d{i}"><hr style="border-top: 1px solid #e5e7eb"></td></tr>
          </table>
        </td></tr>"#
    )
}

fn document(sections: usize) -> String {
    let body: String = (0..sections).map(flat_section).collect();
    format!(
        r#"<!DOCTYPE html><html><head><title>Bench</title></head>
        <body style="background-color: #f4f4f5">
          <table class="email-container" width="600">{body}</table>
        </body></html>"#
    )
}

fn parse_small_email(c: &mut Criterion) {
    let source = document(1);

    c.bench_function("parse_small_email", |b| b.iter(|| parse(black_box(&source))));
}

fn parse_large_email(c: &mut Criterion) {
    let source = document(30);

    c.bench_function("parse_large_email_150_elements", |b| {
        b.iter(|| parse(black_box(&source)))
    });
}

fn tree_only(c: &mut Criterion) {
    let source = document(10);

    c.bench_function("tree_only", |b| b.iter(|| parse_document(black_box(&source))));
}

criterion_group!(benches, parse_small_email, parse_large_email, tree_only);
criterion_main!(benches);
