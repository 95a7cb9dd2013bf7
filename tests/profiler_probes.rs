use chrono::NaiveDate;
use probegraph::application::AnalyzeUsecase;
use probegraph::domain::graph::{GraphNode, NodeKind, ProbeGraph, Relation};
use probegraph::domain::resolver::TypeResolver;
use probegraph::infrastructure::{DynamicCallProbe, HotspotProbe};
use probegraph::ports::json_exporter::JsonExporter;
use probegraph::ports::Probe;
use std::fs;
use tempfile::tempdir;

const PROCESS_FIND: &str = "org.acme.owner.OwnerController.processFindForm(org.acme.owner.Owner,org.springframework.validation.BindingResult,org.springframework.ui.Model)";
const FIND_BY_NAME: &str = "org.acme.owner.OwnerRepository.findByLastName(java.lang.String)";
const GET_PETS: &str = "org.acme.owner.Owner.getPets()";
const INIT_FIND: &str = "org.acme.owner.OwnerController.initFindForm(java.util.Map)";

const CALL_TREE_CSV: &str = r#""Name","Total Time","Invocations"
"org.acme.owner.OwnerController.processFindForm (Owner, BindingResult, Model)","100 ms","3"
"  org.acme.owner.OwnerRepository.findByLastName (String)","60 ms","3"
"    Self time","10 ms","3"
"    org.springframework.data.jpa.SimpleJpaRepository.findAll ()","50 ms","3"
"      org.acme.owner.Owner.getPets ()","5 ms","3"
"  org.acme.owner.OwnerController.initFindForm (Map)","1 ms","1"
"  org.acme.owner.OwnerRepository.findByLastName (String)","20 ms","1"
"#;

fn count(graph: &ProbeGraph, from: &str, to: &str) -> Option<u64> {
    graph.find_edge(from, to).and_then(|e| e.count())
}

#[test]
fn csv_call_tree_becomes_counted_edges() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("calls.csv");
    fs::write(&input, CALL_TREE_CSV).unwrap();

    let graph = DynamicCallProbe::new(&input, "org.acme", TypeResolver::default())
        .collect()
        .unwrap();

    assert_eq!(graph.probe_name.as_deref(), Some("DynamiCall"));
    assert_eq!(graph.nodes_of(NodeKind::Method).count(), 4);
    assert_eq!(graph.edges.len(), 3);
    assert!(graph.edges.iter().all(|e| e.relation_name == Relation::DynamicCall));
    assert_eq!(count(&graph, PROCESS_FIND, FIND_BY_NAME), Some(2));
    assert_eq!(count(&graph, PROCESS_FIND, INIT_FIND), Some(1));
    // the out-of-scope repository frame is dropped, so its callee attaches
    // to the nearest in-scope caller
    assert_eq!(count(&graph, FIND_BY_NAME, GET_PETS), Some(1));
}

#[test]
fn xml_call_tree_becomes_counted_edges() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("calls.xml");
    fs::write(
        &input,
        r#"<?xml version="1.0"?>
<tree>
  <node class="org.acme.A" methodName="run" methodSignature="()V">
    <node class="org.acme.B" methodName="go" methodSignature="(Ljava/lang/String;)V">
      <node class="java.util.HashMap" methodName="get" methodSignature="(Ljava/lang/Object;)Ljava/lang/Object;"/>
      <node class="org.acme.C" methodName="leaf"/>
    </node>
    <node class="org.acme.B" methodName="go" methodSignature="(Ljava/lang/String;)V"/>
  </node>
</tree>
"#,
    )
    .unwrap();

    let graph = DynamicCallProbe::new(&input, "org.acme", TypeResolver::default())
        .collect()
        .unwrap();
    assert_eq!(graph.edges.len(), 2);
    assert_eq!(count(&graph, "org.acme.A.run()", "org.acme.B.go(java.lang.String)"), Some(2));
    assert_eq!(count(&graph, "org.acme.B.go(java.lang.String)", "org.acme.C.leaf()"), Some(1));
}

#[test]
fn exported_json_has_loader_shape() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("calls.csv");
    let output = dir.path().join("out/dynamic_calls.json");
    fs::write(&input, CALL_TREE_CSV).unwrap();

    let probe = DynamicCallProbe::new(&input, "org.acme", TypeResolver::default());
    let summary = AnalyzeUsecase {
        probe: &probe,
        exporter: &JsonExporter,
    }
    .run(&output)
    .unwrap();
    assert_eq!(summary.edges, 3);

    let json: serde_json::Value = serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
    assert_eq!(json["probeName"], "DynamiCall");
    let edge = &json["edges"][0];
    assert_eq!(edge["relationName"], "DCALL");
    assert_eq!(edge["from"]["nodeType"], "Method");
    assert_eq!(edge["from"]["propertyName"], "fullName");
    assert!(edge["properties"]["count"].as_u64().is_some());
}

const HOTSPOT_CSV: &str = r#"Name,Self Time,Self Time (CPU),Total Time,Total Time (CPU),Invocations
"org.acme.vet.VetController.showVetList (int, Model)","1,250 ms (40%)","1,000 ms","2,500 ms","2,000 ms","12"
"org.acme.vet","5 ms","5 ms","5 ms","5 ms","1"
"java.lang.Thread.run ()","9 ms","9 ms","9 ms","9 ms","1"
"org.acme.owner.OwnerController.initCreationForm ()","3.5 ms","","7 ms","n/a","3"
"#;

const MEMORY_CSV: &str = r#"Name,Live Bytes,Allocated Objects
"org.acme.vet.VetController.showVetList (int, Model)","2,048 B","17"
"#;

#[test]
fn hotspots_with_memory_figures() {
    let dir = tempdir().unwrap();
    let perf = dir.path().join("hotspot.csv");
    let memory = dir.path().join("memory.csv");
    fs::write(&perf, HOTSPOT_CSV).unwrap();
    fs::write(&memory, MEMORY_CSV).unwrap();
    let at = NaiveDate::from_ymd_opt(2024, 3, 5)
        .unwrap()
        .and_hms_opt(14, 7, 9)
        .unwrap();

    let graph = HotspotProbe::new(&perf, "org.acme", TypeResolver::default())
        .with_memory(Some(memory))
        .observed_at(at)
        .collect()
        .unwrap();

    assert_eq!(graph.probe_name.as_deref(), Some("HotSpot"));
    assert_eq!(graph.nodes_of(NodeKind::Method).count(), 2);
    assert_eq!(graph.nodes_of(NodeKind::PerformanceHotspot).count(), 2);
    assert_eq!(graph.edges.len(), 2);

    let show = "org.acme.vet.VetController.showVetList(int,org.springframework.ui.Model)";
    let hotspot_id = format!("{show}_20240305140709");
    let edge = graph.find_edge(show, &hotspot_id).unwrap();
    assert_eq!(edge.relation_name, Relation::HasPerformance);

    let node = graph.nodes.iter().find(|n| n.key() == hotspot_id).unwrap();
    assert_eq!(
        node,
        &GraphNode::PerformanceHotspot {
            id: hotspot_id.clone(),
            self_time: 1250.0,
            self_time_cpu: 1000.0,
            total_time: 2500.0,
            total_time_cpu: 2000.0,
            invocations: 12,
            live_bytes: Some(2048.0),
            allocated_objects: Some(17),
        }
    );

    let init = graph
        .nodes
        .iter()
        .find(|n| n.key() == "org.acme.owner.OwnerController.initCreationForm()_20240305140709")
        .unwrap();
    match init {
        GraphNode::PerformanceHotspot {
            self_time,
            self_time_cpu,
            total_time_cpu,
            invocations,
            live_bytes,
            ..
        } => {
            assert_eq!(*self_time, 3.5);
            assert_eq!(*self_time_cpu, 0.0);
            assert_eq!(*total_time_cpu, 0.0);
            assert_eq!(*invocations, 3);
            assert!(live_bytes.is_none());
        }
        other => panic!("unexpected node {other:?}"),
    }
}
