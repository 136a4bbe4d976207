// ============================================================
// Layer 5 - Export Model
// ============================================================
// Stands in for a model's training entrypoint by writing every
// input the model would receive into its output directory:
//
//   <output>/
//     manifest.json                     ← model, params, commands, shapes
//     splits.json | temporal_splits.json
//     teamsvecs.bin                     ← vectors as passed in
//     indexes.json
//
// An external trainer (any language) picks the bundle up from
// there. Embedding variants export their dense skill vectors,
// so the bundle is exactly what the model would have seen.

use anyhow::{Context, Result};
use serde::Serialize;
use std::{fs, path::Path};

use crate::application::settings::ModelParams;
use crate::data::{
    splitter::Splits,
    vectorizer::{SkillVectors, TeamIndexes, TeamVectors, VectorStore},
};
use crate::infra::split_store::{to_json_pretty, SplitStore};
use crate::ml::{ModelKind, TeamModel};

#[derive(Debug, Serialize)]
struct Manifest<'a> {
    model:      &'a str,
    params:     &'a ModelParams,
    cmd:        &'a [String],
    splits:     &'static str,
    n_teams:    usize,
    n_members:  usize,
    skill_repr: &'static str,
    skill_dims: usize,
    n_train:    usize,
    n_test:     usize,
}

pub struct ExportModel {
    kind: ModelKind,
}

impl ExportModel {
    pub fn new(kind: ModelKind) -> Self {
        Self { kind }
    }
}

impl TeamModel for ExportModel {
    fn run(
        &self,
        splits:  &Splits,
        vectors: &TeamVectors,
        indexes: &TeamIndexes,
        output:  &Path,
        params:  &ModelParams,
        cmd:     &[String],
    ) -> Result<()> {
        fs::create_dir_all(output)
            .with_context(|| format!("Cannot create model output '{}'", output.display()))?;

        SplitStore::new(output).save(splits)?;
        VectorStore::new(output).save(vectors, indexes)?;

        let manifest = Manifest {
            model:      self.kind.name(),
            params,
            cmd,
            splits:     splits.file_name(),
            n_teams:    vectors.n_teams(),
            n_members:  vectors.member.n_cols,
            skill_repr: match vectors.skill {
                SkillVectors::Sparse(_) => "sparse",
                SkillVectors::Dense(_)  => "dense",
            },
            skill_dims: vectors.skill.n_cols(),
            n_train:    splits.n_train(),
            n_test:     splits.test().len(),
        };
        let path = output.join("manifest.json");
        fs::write(&path, to_json_pretty(&manifest)?)
            .with_context(|| format!("Cannot write '{}'", path.display()))?;

        tracing::info!(
            "Exported {} inputs ({} teams, {} test) to '{}'",
            self.kind,
            manifest.n_teams,
            manifest.n_test,
            output.display()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::settings::NeuralParams;
    use crate::data::{splitter::create_streaming_splits, vectorizer::SparseRows};

    #[test]
    fn test_bundle_is_written() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out/tfnn");

        let vectors = TeamVectors {
            ids:    vec!["t1".into(), "t2".into()],
            skill:  SkillVectors::Dense(vec![vec![0.1, 0.2], vec![0.3, 0.4]]),
            member: SparseRows { n_cols: 1, rows: vec![vec![0], vec![0]] },
        };
        let splits = Splits::Streaming(create_streaming_splits(2, 0.5).unwrap());
        let params = ModelParams::Fnn(NeuralParams::default());

        ExportModel::new(ModelKind::TfnnEmb)
            .run(&splits, &vectors, &TeamIndexes::default(), &out, &params, &["train".to_string()])
            .unwrap();

        assert!(out.join("temporal_splits.json").exists());
        assert!(out.join("teamsvecs.bin").exists());
        assert!(out.join("indexes.json").exists());

        let manifest: serde_json::Value =
            serde_json::from_slice(&fs::read(out.join("manifest.json")).unwrap()).unwrap();
        assert_eq!(manifest["model"], "tfnn_emb");
        assert_eq!(manifest["skill_repr"], "dense");
        assert_eq!(manifest["skill_dims"], 2);
        assert_eq!(manifest["params"]["family"], "fnn");
        assert_eq!(manifest["params"]["d"], 100);
        assert_eq!(manifest["cmd"][0], "train");
        assert_eq!(manifest["n_train"], 1);
        assert_eq!(manifest["n_test"], 1);
    }
}
