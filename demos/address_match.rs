use indexmap::IndexMap;
use sparse_cosine::{CsrMatrix, SimilarityConfig};

/// 文字3-gram の出現数 (前後に空白を足す)
fn trigrams(text: &str) -> Vec<String> {
    let padded: Vec<char> = format!("  {}  ", text.to_lowercase()).chars().collect();
    padded.windows(3).map(|w| w.iter().collect()).collect()
}

/// 両コーパス共通の語彙で TF-IDF 行列を作る
/// 語彙は token -> 文書頻度 の IndexMap で、挿入順の位置がそのまま列番号になる
fn tf_idf(query: &[&str], target: &[&str]) -> sparse_cosine::Result<(CsrMatrix<f32>, CsrMatrix<f32>)> {
    let docs: Vec<Vec<String>> = query.iter().chain(target).map(|t| trigrams(t)).collect();
    let mut vocab: IndexMap<&str, usize> = IndexMap::new();
    for doc in &docs {
        let mut seen: Vec<&str> = doc.iter().map(String::as_str).collect();
        seen.sort_unstable();
        seen.dedup();
        for token in seen {
            *vocab.entry(token).or_insert(0) += 1;
        }
    }

    let n_docs = docs.len() as f32;
    let mut matrices = (CsrMatrix::new(vocab.len()), CsrMatrix::new(vocab.len()));
    for (i, doc) in docs.iter().enumerate() {
        let entries = doc.iter().filter_map(|g| {
            let (id, _, &doc_freq) = vocab.get_full(g.as_str())?;
            let idf = ((1.0 + n_docs) / (1.0 + doc_freq as f32)).ln() + 1.0;
            Some((id, idf / doc.len() as f32))
        });
        if i < query.len() {
            matrices.0.push_row(entries)?;
        } else {
            matrices.1.push_row(entries)?;
        }
    }
    Ok(matrices)
}

fn main() -> sparse_cosine::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();

    let messy = ["12 Hig St, Springfeld", "Flat 3 45 Oak Road Rivertn", "7 Mapel Ave"];
    let clean = [
        "12 High Street, Springfield",
        "45 Oak Road, Riverton, Flat 3",
        "7 Maple Avenue",
        "70 Maple Avenue",
        "12 High Road, Springvale",
    ];

    let (query, target) = tf_idf(&messy, &clean)?;
    let engine = SimilarityConfig::from_json_str(r#"{"backend":"parallel"}"#)?.build()?;
    let hits = engine.cosine_similarity_top_k(&query, &target, 2)?;

    for (address, hits) in messy.iter().zip(&hits) {
        println!("{address}");
        for (target, score) in &hits.list {
            println!("    {:.3}  {}", score, clean[*target]);
        }
    }
    Ok(())
}
