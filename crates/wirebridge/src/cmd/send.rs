use std::net::TcpStream;
use std::time::Duration;

use serde_json::Value;
use wirebridge_codec::{JsonCodec, Message, MessageCodec};
use wirebridge_frame::{FrameConfig, FrameReader, FrameWriter};

use crate::cmd::SendArgs;
use crate::exit::{codec_error, frame_error, io_error, CliError, CliResult, SUCCESS, USAGE};
use crate::output::{print_message, OutputFormat};

pub fn run(args: SendArgs, format: OutputFormat) -> CliResult<i32> {
    let wait_timeout = parse_duration(&args.wait_timeout)?;
    let message = build_message(&args)?;

    let stream = TcpStream::connect((args.host.as_str(), args.port))
        .map_err(|err| io_error("connect failed", err))?;

    let codec = JsonCodec;
    let payload = codec
        .encode(&message)
        .map_err(|err| codec_error("encode failed", err))?;

    let writer_stream = stream
        .try_clone()
        .map_err(|err| io_error("connect failed", err))?;
    let mut writer = FrameWriter::new(writer_stream);
    writer
        .send(&payload)
        .map_err(|err| frame_error("send failed", err))?;

    if args.wait {
        let config = FrameConfig {
            read_timeout: Some(wait_timeout),
            ..FrameConfig::default()
        };
        let mut reader = FrameReader::with_config_tcp(stream, config)
            .map_err(|err| frame_error("receive failed", err))?;
        let received = reader
            .read_frame()
            .map_err(|err| frame_error("receive failed", err))?;
        let decoded = codec
            .decode(&received)
            .map_err(|err| codec_error("receive failed", err))?;
        print_message(&decoded, format);
    }

    Ok(SUCCESS)
}

fn build_message(args: &SendArgs) -> CliResult<Message> {
    let Some(raw) = &args.payload else {
        return Ok(Message::new(args.msg_type.clone()));
    };

    let value: Value = serde_json::from_str(raw)
        .map_err(|err| CliError::new(USAGE, format!("--payload is not valid JSON: {err}")))?;
    let Value::Object(fields) = value else {
        return Err(CliError::new(USAGE, "--payload must be a JSON object"));
    };
    Ok(Message::with_payload(args.msg_type.clone(), fields))
}

fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, unit) = if let Some(num) = input.strip_suffix("ms") {
        (num, "ms")
    } else if let Some(num) = input.strip_suffix('s') {
        (num, "s")
    } else {
        (input, "s")
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    match unit {
        "ms" => Ok(Duration::from_millis(value)),
        "s" => Ok(Duration::from_secs(value)),
        _ => Err(CliError::new(
            USAGE,
            format!("unsupported duration unit: {unit}"),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args_with_payload(payload: Option<&str>) -> SendArgs {
        SendArgs {
            host: "127.0.0.1".to_string(),
            port: 12345,
            msg_type: "ping".to_string(),
            payload: payload.map(str::to_string),
            wait: false,
            wait_timeout: "5s".to_string(),
        }
    }

    #[test]
    fn build_message_without_payload() {
        let msg = build_message(&args_with_payload(None)).unwrap();
        assert_eq!(msg.msg_type(), "ping");
        assert!(msg.payload().is_empty());
    }

    #[test]
    fn build_message_with_object_payload() {
        let msg = build_message(&args_with_payload(Some(r#"{"seq":7}"#))).unwrap();
        assert_eq!(msg.get("seq"), Some(&Value::from(7)));
    }

    #[test]
    fn build_message_rejects_non_object_payload() {
        let err = build_message(&args_with_payload(Some("[1,2,3]"))).unwrap_err();
        assert_eq!(err.code, USAGE);
    }

    #[test]
    fn build_message_rejects_invalid_json() {
        let err = build_message(&args_with_payload(Some("{nope"))).unwrap_err();
        assert_eq!(err.code, USAGE);
    }

    #[test]
    fn parse_duration_seconds_and_millis() {
        assert_eq!(parse_duration("2s").unwrap(), Duration::from_secs(2));
        assert_eq!(parse_duration("150ms").unwrap(), Duration::from_millis(150));
        assert_eq!(parse_duration("3").unwrap(), Duration::from_secs(3));
    }

    #[test]
    fn parse_duration_rejects_invalid_values() {
        assert!(parse_duration("0s").is_err());
        assert!(parse_duration("bad").is_err());
    }

    #[test]
    fn roundtrip_against_listening_socket() {
        use std::sync::mpsc;

        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let (tx, rx) = mpsc::channel();

        let server = std::thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut reader = FrameReader::new(stream);
            let payload = reader.read_frame().unwrap();
            tx.send(payload.to_vec()).unwrap();
        });

        let mut args = args_with_payload(Some(r#"{"n":1}"#));
        args.port = port;
        let code = run(args, OutputFormat::Pretty).unwrap();
        assert_eq!(code, SUCCESS);

        let wire = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        let msg = JsonCodec.decode(&wire).unwrap();
        assert_eq!(msg.msg_type(), "ping");
        assert_eq!(msg.get("n"), Some(&Value::from(1)));
        server.join().unwrap();
    }
}
