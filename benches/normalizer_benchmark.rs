//! Normalizer throughput over a realistic mix of listing texts

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use job_harvester::domain::{
    DetailAugmentation, RawListing, StandardizedRecord, parse_experience, parse_salary,
};

const SALARIES: &[&str] = &[
    "15-25K·14薪",
    "8-12k",
    "100-200元/天",
    "面议",
    "30-60K·16薪",
    "",
];

const EXPERIENCE: &[&str] = &["3-5年", "10年以上", "1年以内", "经验不限", "应届生", "5-10年"];

fn benchmark_salary_parsing(c: &mut Criterion) {
    c.bench_function("parse_salary mixed", |b| {
        b.iter(|| {
            for text in SALARIES {
                black_box(parse_salary(Some(black_box(text))));
            }
        });
    });
}

fn benchmark_experience_parsing(c: &mut Criterion) {
    c.bench_function("parse_experience mixed", |b| {
        b.iter(|| {
            for text in EXPERIENCE {
                black_box(parse_experience(Some(black_box(text))));
            }
        });
    });
}

fn benchmark_standardize_batch(c: &mut Criterion) {
    let listings: Vec<RawListing> = (0..30)
        .map(|i| RawListing {
            job_id: format!("job-{i}"),
            salary_text: Some(SALARIES[i % SALARIES.len()].to_string()),
            experience_text: Some(EXPERIENCE[i % EXPERIENCE.len()].to_string()),
            skills: vec!["Rust".to_string(), "分布式".to_string()],
            ..RawListing::default()
        })
        .collect();

    c.bench_function("standardize 30 listings", |b| {
        b.iter(|| {
            for raw in &listings {
                black_box(StandardizedRecord::standardize(
                    raw.clone(),
                    DetailAugmentation::absent(),
                ));
            }
        });
    });
}

criterion_group!(
    benches,
    benchmark_salary_parsing,
    benchmark_experience_parsing,
    benchmark_standardize_batch
);
criterion_main!(benches);
