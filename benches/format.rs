use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use forum_markup::formatter::Formatter;
use forum_markup::paragraph::normalize_paragraphs;
use forum_markup::repair::repair_markup;

fn generate_post(paragraphs: usize) -> String {
    let mut post = String::new();
    for i in 0..paragraphs {
        if i > 0 {
            post.push_str("\n\n");
        }
        post.push_str(&format!(
            "Reply {i} quoting <b>someone</b> with a <a href=\"/t/{i}\" onclick=\"track()\">link</a>\n\
             and an <img src=\"/smilies/{i}.png\" alt=\":)\"> <span style=\"color:red\">colored</span> <i>aside"
        ));
    }
    post
}

fn bench_format(c: &mut Criterion) {
    let mut group = c.benchmark_group("format");
    group.sample_size(20);

    let formatter = Formatter::default();
    for paragraphs in [1, 10, 100] {
        let post = generate_post(paragraphs);
        group.bench_with_input(BenchmarkId::from_parameter(paragraphs), &post, |b, post| {
            b.iter(|| {
                let html = formatter.format(std::hint::black_box(post));
                std::hint::black_box(html)
            });
        });
    }

    group.finish();
}

fn bench_stages(c: &mut Criterion) {
    let mut group = c.benchmark_group("stages");
    group.sample_size(20);

    let post = generate_post(100);
    group.bench_function("normalize_paragraphs", |b| {
        b.iter(|| std::hint::black_box(normalize_paragraphs(std::hint::black_box(&post))));
    });

    let paragraphs = normalize_paragraphs(&post);
    group.bench_function("repair_markup", |b| {
        b.iter(|| {
            let repaired = repair_markup(std::hint::black_box(&paragraphs));
            std::hint::black_box(repaired.body().is_some())
        });
    });

    group.finish();
}

criterion_group!(benches, bench_format, bench_stages);
criterion_main!(benches);
