use super::*;

// =========================================================================
// Defaults
// =========================================================================

#[test]
fn test_default_config_is_valid() {
  let config = TilingConfig::default();
  config.validate().expect("defaults must validate");
  assert_eq!(config.mesh.max_triangles_per_tile, 8 * 65536);
  assert_eq!(config.mesh.min_node_size, 1.0);
  assert_eq!(config.weld.options.bucket_size, 50);
  assert!(config.weld.enabled);
}

/// Default LOD table halves from 1024 down to 1.
#[test]
fn test_default_lod_table() {
  let lod = LodConfig::default();
  assert_eq!(lod.levels.len(), 11);
  assert_eq!(lod.error_at(0), 1024.0);
  assert_eq!(lod.error_at(10), 1.0);
  assert_eq!(lod.texture_scale_at(10), 1.0);
  assert_eq!(lod.next_error(0), Some(512.0));
  assert_eq!(lod.next_error(10), None);
  assert!(lod.is_max(10));
  assert!(lod.is_max(42), "levels beyond the table clamp to the maximum");
}

#[test]
fn test_lod_clamp_respects_min_level() {
  let lod = LodConfig {
    min_level: 2,
    max_level: 4,
    ..LodConfig::default()
  };
  assert_eq!(lod.clamp(0), 2);
  assert_eq!(lod.clamp(3), 3);
  assert_eq!(lod.clamp(9), 4);
  assert_eq!(lod.error_at(0), 256.0);
}

// =========================================================================
// TOML
// =========================================================================

#[test]
fn test_empty_toml_uses_defaults() {
  let config = TilingConfig::from_toml_str("").unwrap();
  assert_eq!(config, TilingConfig::default());
}

#[test]
fn test_toml_sections() {
  let config = TilingConfig::from_toml_str(
    r#"
      [weld]
      enabled = false
      error = 0.01
      check_normal = false

      [mesh]
      max_triangles_per_tile = 1000
      split_axes = "xy"

      [points]
      max_points_per_node = 500

      [lod]
      min_level = 0
      max_level = 1
      levels = [
        { geometric_error = 100.0, texture_scale = 0.5 },
        { geometric_error = 10.0, texture_scale = 1.0 },
      ]

      [georeference]
      kind = "local"
      longitude = 6.95
      latitude = 50.94
      height = 55.0
    "#,
  )
  .unwrap();

  assert!(!config.weld.enabled);
  assert_eq!(config.weld.options.error, 0.01);
  assert!(!config.weld.options.check_normal);
  assert!(config.weld.options.check_texcoord);
  assert_eq!(config.mesh.max_triangles_per_tile, 1000);
  assert_eq!(config.mesh.split_axes, SplitAxes::Xy);
  assert_eq!(config.points.max_points_per_node, 500);
  assert_eq!(config.lod.levels.len(), 2);
  assert_eq!(
    config.georeference,
    GeoreferenceConfig::Local {
      longitude: 6.95,
      latitude: 50.94,
      height: 55.0
    }
  );
}

#[test]
fn test_toml_parse_error() {
  let err = TilingConfig::from_toml_str("[mesh]\nmax_triangles_per_tile = \"many\"").unwrap_err();
  assert!(matches!(err, TilingError::ConfigParse { .. }));
}

// =========================================================================
// Validation
// =========================================================================

#[test]
fn test_rejects_non_decreasing_lod_table() {
  let lod = LodConfig {
    min_level: 0,
    max_level: 1,
    levels: vec![
      LodLevel {
        geometric_error: 10.0,
        texture_scale: 1.0,
      },
      LodLevel {
        geometric_error: 10.0,
        texture_scale: 1.0,
      },
    ],
  };
  let err = TilingConfig::default().with_lod(lod).validate().unwrap_err();
  assert!(matches!(err, TilingError::Config(_)));
}

#[test]
fn test_rejects_level_range_outside_table() {
  let mut lod = LodConfig::halving(100.0, 3);
  lod.max_level = 3;
  assert!(TilingConfig::default().with_lod(lod).validate().is_err());
}

#[test]
fn test_rejects_zero_ceilings() {
  assert!(TilingConfig::default().with_max_triangles(0).validate().is_err());
  assert!(TilingConfig::default().with_max_points(0).validate().is_err());
  assert!(TilingConfig::default()
    .with_max_primitive_vertices(2)
    .validate()
    .is_err());
}

#[test]
fn test_rejects_negative_weld_error() {
  let options = WeldOptions {
    error: -1.0,
    ..WeldOptions::default()
  };
  assert!(TilingConfig::default().with_weld_options(options).validate().is_err());
}

#[test]
fn test_load_missing_file() {
  let err = TilingConfig::load(Path::new("/definitely/not/here.toml")).unwrap_err();
  assert!(matches!(err, TilingError::Io { .. }));
}
