use anyhow::Result;
use clap::builder::FalseyValueParser;
use clap::{Parser, Subcommand};
use rayon::ThreadPoolBuilder;
use std::path::PathBuf;
use tracing::{error, info};
use zone_geo::bounding_box::{to_yaml_snippet, zone_bounding_box};
use zone_geo::config::{
    DEFAULT_BOUNDING_BOX_PADDING, DEFAULT_MAX_CONVEX_DEVIATION, DEFAULT_MIN_AREA_HOLES,
    DEFAULT_MIN_AREA_INTERSECTION, DEFAULT_NORMALIZE_PRECISION, DEFAULT_OUTPUT_PRECISION,
    DEFAULT_SLIVER_RATIO,
};
use zone_geo::parser::read_world;
use zone_geo::{pipeline, GeoBuildConfig, WriteOutcome};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// ゾーンポリゴンの GeoJSON
    #[arg(long, value_name = "FILE", default_value = "geo/world.geojson", global = true)]
    world: PathBuf,

    /// 出力するトポロジー (world.json)
    #[arg(long, value_name = "FILE", default_value = "src/config/world.json", global = true)]
    out: PathBuf,

    /// 出力する除外エクスチェンジ一覧
    #[arg(
        long,
        value_name = "FILE",
        default_value = "src/config/excludedAggregatedExchanges.json",
        global = true
    )]
    exclusions: PathBuf,

    /// gaps.geojson の出力先ディレクトリ
    #[arg(long, value_name = "DIR", default_value = "geo", global = true)]
    error_dir: PathBuf,

    /// ゾーン設定 YAML のディレクトリ
    #[arg(long, value_name = "DIR", default_value = "config/zones", global = true)]
    zones_dir: PathBuf,

    /// エクスチェンジ設定 YAML のディレクトリ
    #[arg(long, value_name = "DIR", default_value = "config/exchanges", global = true)]
    exchanges_dir: PathBuf,

    /// 隙間とみなす穴の最大面積 (m²)
    #[arg(long, default_value_t = DEFAULT_MIN_AREA_HOLES, global = true)]
    min_area_holes: f64,

    /// 凸包との面積差の許容値
    #[arg(long, default_value_t = DEFAULT_MAX_CONVEX_DEVIATION, global = true)]
    max_convex_deviation: f64,

    /// 重なりとみなす最小面積 (m²)
    #[arg(long, default_value_t = DEFAULT_MIN_AREA_INTERSECTION, global = true)]
    min_area_intersection: f64,

    /// 隙間とみなす周長/面積比の下限
    #[arg(long, default_value_t = DEFAULT_SLIVER_RATIO, global = true)]
    sliver_ratio: f64,

    /// 正規化時の小数点以下桁数
    #[arg(long, default_value_t = DEFAULT_NORMALIZE_PRECISION, global = true)]
    normalize_precision: u32,

    /// 出力座標の小数点以下桁数
    #[arg(long, default_value_t = DEFAULT_OUTPUT_PRECISION, global = true)]
    output_precision: u32,

    /// 成果物に差分があればエラーにする（CI 用）
    #[arg(
        long,
        env = "VERIFY_NO_UPDATES",
        value_parser = FalseyValueParser::new(),
        global = true
    )]
    verify_no_updates: bool,

    /// 並列処理スレッド数（デフォルト: CPUコア数）
    #[arg(short, long, global = true)]
    threads: Option<usize>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// 検証して world.json と除外一覧を生成（デフォルト）
    Build,
    /// 検証のみ行う
    Validate,
    /// ゾーン設定用の bounding_box を出力
    BoundingBox {
        /// ゾーンキー（例: DK-DK1）
        zone: Option<String>,

        /// 外側に広げる幅（度）
        #[arg(long, default_value_t = DEFAULT_BOUNDING_BOX_PADDING)]
        padding: f64,
    },
}

impl Args {
    fn build_config(&self) -> GeoBuildConfig {
        GeoBuildConfig {
            world_path: self.world.clone(),
            out_path: self.out.clone(),
            exclusions_path: self.exclusions.clone(),
            error_path: self.error_dir.clone(),
            zones_dir: self.zones_dir.clone(),
            exchanges_dir: self.exchanges_dir.clone(),
            min_area_holes: self.min_area_holes,
            max_convex_deviation: self.max_convex_deviation,
            min_area_intersection: self.min_area_intersection,
            sliver_ratio: self.sliver_ratio,
            normalize_precision: self.normalize_precision,
            output_precision: self.output_precision,
            verify_no_updates: self.verify_no_updates,
            ..GeoBuildConfig::default()
        }
    }
}

fn main() -> Result<()> {
    // ログの初期化（標準出力はスニペット用に空けておく）
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    // CLI引数の解析
    let args = Args::parse();

    // 処理開始時間を記録
    let start_time = std::time::Instant::now();

    // スレッドプールの設定
    if let Some(threads) = args.threads {
        ThreadPoolBuilder::new().num_threads(threads).build_global()?;
    }

    let config = args.build_config();
    match &args.command {
        None | Some(Command::Build) => build(&config)?,
        Some(Command::Validate) => {
            let zones = pipeline::check(&config)?;
            info!("Validated {} zones", zones);
        }
        Some(Command::BoundingBox { zone, padding }) => {
            let Some(zone) = zone else {
                error!("No zone key given");
                anyhow::bail!("missing zone key, e.g. `zone-geo bounding-box DK-DK1`");
            };
            let features = read_world(&config.world_path)?;
            let bbox = zone_bounding_box(&features, zone, *padding, config.output_precision)?;
            print!("{}", to_yaml_snippet(bbox)?);
        }
    }

    // 処理時間を表示
    let elapsed = start_time.elapsed();
    info!("Total processing time: {:?}", elapsed);

    Ok(())
}

fn build(config: &GeoBuildConfig) -> Result<()> {
    if config.verify_no_updates {
        info!("Verifying that the committed artifacts are up to date");
    }

    let report = pipeline::run(config)?;

    let describe = |outcome: WriteOutcome| match outcome {
        WriteOutcome::Written => "written",
        WriteOutcome::Unchanged => "unchanged",
    };
    info!(
        "Built {} zones (world.json {}, exclusions {})",
        report.zones,
        describe(report.world),
        describe(report.exclusions)
    );
    Ok(())
}
