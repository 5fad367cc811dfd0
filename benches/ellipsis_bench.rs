use std::hint::black_box;
use std::time::Instant;

use text_ellipsis::{
    CellBox, DisplayContent, EllipsisConfig, EllipsisController, RenderTarget, SearchStrategy,
    TextSource, TruncationEngine,
};

const BOX_COLUMNS: usize = 48;
const BOX_ROWS: usize = 3;

const LENGTHS: &[(&str, usize)] = &[
    ("words-40", 40),
    ("words-400", 400),
    ("words-4000", 4000),
];

const WORDS: &[&str] = &[
    "margin", "folio", "quill", "vellum", "serif", "kerning", "leading", "glyph", "spine",
    "gutter", "recto", "verso", "colophon", "octavo",
];

struct CaseResult {
    fixture: String,
    case: String,
    iterations: usize,
    measurements: usize,
    min_ns: u128,
    median_ns: u128,
    mean_ns: u128,
    max_ns: u128,
}

fn corpus(words: usize) -> String {
    (0..words)
        .map(|idx| WORDS[(idx * 7 + idx / 3) % WORDS.len()])
        .collect::<Vec<_>>()
        .join(" ")
}

fn markup_corpus(words: usize) -> String {
    let mut out = String::from("<p>");
    for (idx, word) in corpus(words).split(' ').enumerate() {
        if idx > 0 {
            out.push(' ');
        }
        if idx % 5 == 0 {
            out.push_str("<em>");
            out.push_str(word);
            out.push_str("</em>");
        } else {
            out.push_str(word);
        }
    }
    out.push_str("</p>");
    out
}

fn percentile_u128(sorted: &[u128], percentile: f64) -> u128 {
    let idx = ((sorted.len().saturating_sub(1) as f64) * percentile).round() as usize;
    sorted[idx]
}

fn truncate_once(strategy: SearchStrategy, source: &TextSource) -> usize {
    let mut cell = CellBox::new(BOX_COLUMNS, BOX_ROWS);
    let mut probe = |content: &DisplayContent| {
        cell.render(content);
        cell.metrics().overflows()
    };
    TruncationEngine::with_strategy(strategy)
        .truncate(source, &EllipsisConfig::default(), &mut probe)
        .measurements
}

fn run_case<F>(
    fixture: &str,
    case: &str,
    warmup_iters: usize,
    measure_iters: usize,
    mut op: F,
) -> CaseResult
where
    F: FnMut() -> usize,
{
    let mut measurements = 0;
    for _ in 0..warmup_iters {
        measurements = black_box(op());
    }

    let mut time_samples = Vec::with_capacity(measure_iters);
    for _ in 0..measure_iters {
        let start = Instant::now();
        measurements = black_box(op());
        time_samples.push(start.elapsed().as_nanos());
    }
    time_samples.sort_unstable();
    let time_sum: u128 = time_samples.iter().copied().sum();

    CaseResult {
        fixture: fixture.to_string(),
        case: case.to_string(),
        iterations: measure_iters,
        measurements,
        min_ns: time_samples[0],
        median_ns: percentile_u128(&time_samples, 0.5),
        mean_ns: time_sum / time_samples.len() as u128,
        max_ns: time_samples[time_samples.len() - 1],
    }
}

fn main() {
    let quick = std::env::args().any(|arg| arg == "--quick");
    let warmup_iters = if quick { 1 } else { 3 };
    let measure_iters = if quick { 5 } else { 30 };

    println!("# text-ellipsis benchmark");
    println!(
        "# mode={} warmup_iters={} measure_iters={} box={}x{}",
        if quick { "quick" } else { "full" },
        warmup_iters,
        measure_iters,
        BOX_COLUMNS,
        BOX_ROWS
    );
    println!("fixture,case,iterations,measurements,min_ns,median_ns,mean_ns,max_ns");

    let mut results = Vec::new();
    for (fixture, words) in LENGTHS {
        let plain = TextSource::plain(corpus(*words));
        let markup = TextSource::markup(markup_corpus(*words));

        results.push(run_case(fixture, "linear_plain", warmup_iters, measure_iters, || {
            truncate_once(SearchStrategy::Linear, &plain)
        }));
        results.push(run_case(fixture, "binary_plain", warmup_iters, measure_iters, || {
            truncate_once(SearchStrategy::Binary, &plain)
        }));
        results.push(run_case(fixture, "binary_markup", warmup_iters, measure_iters, || {
            truncate_once(SearchStrategy::Binary, &markup)
        }));
        results.push(run_case(
            fixture,
            "controller_pass",
            warmup_iters,
            measure_iters,
            || {
                let now = Instant::now();
                let mut controller = EllipsisController::attach(
                    CellBox::new(BOX_COLUMNS, BOX_ROWS),
                    EllipsisConfig::default(),
                    now,
                )
                .unwrap_or_else(|e| panic!("attach failed: {}", e))
                .with_engine(TruncationEngine::with_strategy(SearchStrategy::Binary));
                controller.set_source(Some(plain.clone()), now);
                controller.poll(now);
                controller.state().measurements
            },
        ));
    }

    for result in &results {
        println!(
            "{},{},{},{},{},{},{},{}",
            result.fixture,
            result.case,
            result.iterations,
            result.measurements,
            result.min_ns,
            result.median_ns,
            result.mean_ns,
            result.max_ns,
        );
    }
}
