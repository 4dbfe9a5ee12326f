use crate::core::system::Application;
use crate::domain::model::Direction;

fn quote(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\\\""))
}

/// Graphviz description of one application, for debugging only.
pub fn export_dot(app: &Application) -> String {
    let graph = &app.graph;
    let mut lines = vec![format!("digraph {} {{", quote(&app.name))];

    for module in graph.module_list() {
        lines.push(format!(
            "    {} [shape=box, label={}];",
            quote(&module.name),
            quote(&format!("{}\\n{}", module.name, module.plugin()))
        ));
    }

    for endpoint in graph.endpoints() {
        lines.push(format!(
            "    {} [shape=ellipse, style=dashed];",
            quote(&endpoint.name)
        ));
        if let Some(port) = &endpoint.bound_port {
            let (from, to) = match endpoint.direction {
                Direction::In => (endpoint.name.as_str(), port.module()),
                Direction::Out => (port.module(), endpoint.name.as_str()),
            };
            lines.push(format!(
                "    {} -> {} [label={}];",
                quote(from),
                quote(to),
                quote(port.port())
            ));
        }
    }

    for queue in graph.queues() {
        for sender in &queue.senders {
            for receiver in &queue.receivers {
                lines.push(format!(
                    "    {} -> {} [label={}];",
                    quote(sender.module()),
                    quote(receiver.module()),
                    quote(&format!("{} ({})", queue.name, queue.capacity))
                ));
            }
        }
    }

    lines.push("}".to_string());
    lines.join("\n") + "\n"
}
